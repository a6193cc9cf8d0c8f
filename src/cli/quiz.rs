use std::sync::Arc;

use anyhow::anyhow;
use clap::Subcommand;

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::cli::{DIM, paint};
use crate::models::quiz::{QuizQuestion, QuizQuestionPayload};

#[derive(Debug, Subcommand)]
pub enum QuizCommand {
    /// List quiz questions, inactive ones included
    List,
    /// Add a question
    Add {
        #[arg(long)]
        question: String,
        /// Answer option, repeat for each one
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[arg(long, default_value_t = 0)]
        order: i64,
        /// Create the question hidden from the public quiz
        #[arg(long)]
        inactive: bool,
    },
    /// Replace a question's text, options, order or visibility
    Update {
        id: i64,
        #[arg(long)]
        question: String,
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[arg(long, default_value_t = 0)]
        order: i64,
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a question
    Delete { id: i64 },
}

pub async fn run(client: &Arc<ApiClient>, command: QuizCommand) -> ApiResult<()> {
    match command {
        QuizCommand::List => {
            let questions = client.quiz_questions().await?;
            if questions.is_empty() {
                println!("No quiz questions");
                return Ok(());
            }
            for question in &questions {
                print_question(question);
            }
        }
        QuizCommand::Add {
            question,
            options,
            order,
            inactive,
        } => {
            let payload = build_payload(question, options, order, inactive)?;
            let created = client.create_quiz_question(&payload).await?;
            println!("Created question #{}", created.id);
            print_question(&created);
        }
        QuizCommand::Update {
            id,
            question,
            options,
            order,
            inactive,
        } => {
            let payload = build_payload(question, options, order, inactive)?;
            let updated = client.update_quiz_question(id, &payload).await?;
            print_question(&updated);
        }
        QuizCommand::Delete { id } => {
            client.delete_quiz_question(id).await?;
            println!("Deleted question #{}", id);
        }
    }
    Ok(())
}

fn build_payload(
    question: String,
    options: Vec<String>,
    order: i64,
    inactive: bool,
) -> ApiResult<QuizQuestionPayload> {
    if question.trim().is_empty() {
        return Err(ApiError::new(
            ApiErrorKind::Validation,
            anyhow!("текст вопроса обязателен"),
        ));
    }
    if options.iter().any(|option| option.trim().is_empty()) {
        return Err(ApiError::new(
            ApiErrorKind::Validation,
            anyhow!("варианты ответа не могут быть пустыми"),
        ));
    }
    Ok(QuizQuestionPayload {
        question,
        options,
        order,
        is_active: !inactive,
    })
}

fn print_question(question: &QuizQuestion) {
    let suffix = if question.is_active {
        String::new()
    } else {
        format!(" {}", paint(DIM, "inactive"))
    };
    println!("#{:<4} [{}] {}{}", question.id, question.order, question.question, suffix);
    for option in &question.options {
        println!("       - {}", option);
    }
}
