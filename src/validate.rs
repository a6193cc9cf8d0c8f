use std::sync::LazyLock;

use regex::Regex;

use crate::models::plot::LandPlotCreate;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Reduces any operator-typed phone to the canonical 11-digit form
/// starting with 7. Accepts a leading 8 (domestic dialing) and any
/// punctuation; everything else is rejected.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return None;
    }
    match digits.as_bytes()[0] {
        b'7' => Some(digits),
        b'8' => Some(format!("7{}", &digits[1..])),
        _ => None,
    }
}

/// Display format `+7 (XXX) XXX-XX-XX`. Inputs that do not normalize
/// are returned unchanged, matching how the catalog renders unknown
/// numbers.
pub fn format_phone(raw: &str) -> String {
    match normalize_phone(raw) {
        Some(digits) => format!(
            "+7 ({}) {}-{}-{}",
            &digits[1..4],
            &digits[4..7],
            &digits[7..9],
            &digits[9..11]
        ),
        None => raw.to_string(),
    }
}

pub fn validate_phone(raw: &str) -> bool {
    normalize_phone(raw).is_some()
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Pre-flight check before `POST /plots/`. Returns one message per
/// violated field, in the operator's language; empty means the payload
/// may go out.
pub fn validate_plot(plot: &LandPlotCreate) -> Vec<String> {
    let mut problems = Vec::new();
    if plot.title.trim().is_empty() {
        problems.push("Название участка обязательно".to_string());
    }
    if plot.description.text.trim().is_empty() {
        problems.push("Описание участка обязательно".to_string());
    }
    if plot.cadastral_numbers.is_empty() {
        problems.push("Кадастровый номер обязателен".to_string());
    }
    if plot.location.trim().is_empty() {
        problems.push("Населенный пункт обязателен".to_string());
    }
    if plot.region.trim().is_empty() {
        problems.push("Регион обязателен".to_string());
    }
    if plot.land_category.trim().is_empty() {
        problems.push("Категория земель обязательна".to_string());
    }
    if plot.permitted_use.trim().is_empty() {
        problems.push("Вид разрешенного использования обязателен".to_string());
    }
    if plot.area <= 0.0 {
        problems.push("Площадь должна быть больше нуля".to_string());
    }
    if plot.price <= 0 {
        problems.push("Стоимость должна быть больше нуля".to_string());
    }
    problems
}

/// Unit prices derived from the total. Area is measured in sotka, one
/// sotka being 100 m². Returns `(price_per_sotka, price_per_meter)`.
pub fn derive_unit_prices(price: i64, area: f64) -> (i64, i64) {
    let per_sotka = (price as f64 / area).round() as i64;
    let per_meter = (price as f64 / (area * 100.0)).round() as i64;
    (per_sotka, per_meter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plot::Description;

    #[test]
    fn phones_normalize_across_input_styles() {
        assert_eq!(
            normalize_phone("8 (999) 123-45-67").as_deref(),
            Some("79991234567")
        );
        assert_eq!(
            normalize_phone("+7 999 123 45 67").as_deref(),
            Some("79991234567")
        );
        assert_eq!(normalize_phone("999 123-45-67"), None);
        assert_eq!(normalize_phone("59991234567"), None);
    }

    #[test]
    fn formatting_matches_the_catalog_style() {
        assert_eq!(format_phone("89991234567"), "+7 (999) 123-45-67");
        assert_eq!(format_phone("короткий"), "короткий");
    }

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(validate_email("info@altailand.ru"));
        assert!(!validate_email("не почта"));
        assert!(!validate_email("a@b"));
    }

    fn filled_plot() -> LandPlotCreate {
        LandPlotCreate {
            title: "Участок у реки".to_string(),
            description: Description {
                text: "Ровный участок на берегу Катуни".to_string(),
                attachments: Vec::new(),
            },
            cadastral_numbers: vec!["04:01:010101:123".to_string()],
            location: "с. Майма".to_string(),
            region: "Республика Алтай".to_string(),
            land_category: "Земли населенных пунктов".to_string(),
            permitted_use: "ИЖС".to_string(),
            area: 10.0,
            price: 1_500_000,
            ..Default::default()
        }
    }

    #[test]
    fn blank_plot_collects_every_field_message() {
        let problems = validate_plot(&LandPlotCreate::default());
        assert_eq!(problems.len(), 9);
        assert!(problems.contains(&"Название участка обязательно".to_string()));
    }

    #[test]
    fn filled_plot_passes() {
        assert!(validate_plot(&filled_plot()).is_empty());
    }

    // The backend 422s on both of these at create time, so they have to
    // be caught before a publish creates the plot.
    #[test]
    fn description_and_cadastral_are_required() {
        let mut plot = filled_plot();
        plot.description.text.clear();
        plot.cadastral_numbers.clear();
        let problems = validate_plot(&plot);
        assert_eq!(problems.len(), 2);
        assert!(problems.contains(&"Описание участка обязательно".to_string()));
        assert!(problems.contains(&"Кадастровый номер обязателен".to_string()));
    }

    #[test]
    fn unit_prices_round_to_whole_rubles() {
        assert_eq!(derive_unit_prices(1_500_000, 10.0), (150_000, 1_500));
        assert_eq!(derive_unit_prices(1_000_000, 3.0), (333_333, 3_333));
    }
}
