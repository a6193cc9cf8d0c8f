use serde_json::json;

use crate::api::{ApiClient, ApiResult};
use crate::models::plot::{LandPlot, LandPlotCreate, LandPlotUpdate, PlotCount, PlotQuery};

/// Catalog and plot CRUD. The public listing only returns visible
/// plots; the `/admin/plots` variants include hidden ones and require
/// a session.
impl ApiClient {
    pub async fn list_plots(&self, query: &PlotQuery) -> ApiResult<Vec<LandPlot>> {
        self.get_query_json("/plots/", query).await
    }

    pub async fn plot_count(&self, query: &PlotQuery) -> ApiResult<PlotCount> {
        self.get_query_json("/plots/count", query).await
    }

    pub async fn get_plot(&self, plot_id: i64) -> ApiResult<LandPlot> {
        self.get_json(&format!("/plots/{}", plot_id)).await
    }

    pub async fn list_regions(&self) -> ApiResult<Vec<String>> {
        self.get_json("/plots/regions").await
    }

    pub async fn list_locations(&self, region: Option<&str>) -> ApiResult<Vec<String>> {
        match region {
            Some(region) => {
                self.get_query_json("/plots/locations", &[("region", region)])
                    .await
            }
            None => self.get_json("/plots/locations").await,
        }
    }

    pub async fn list_categories(&self) -> ApiResult<Vec<String>> {
        self.get_json("/plots/categories").await
    }

    pub async fn create_plot(&self, plot: &LandPlotCreate) -> ApiResult<LandPlot> {
        self.post_json("/plots/", plot).await
    }

    pub async fn update_plot(&self, plot_id: i64, update: &LandPlotUpdate) -> ApiResult<LandPlot> {
        self.patch_admin_json(&format!("/admin/plots/{}", plot_id), update)
            .await
    }

    pub async fn set_plot_visibility(&self, plot_id: i64, visible: bool) -> ApiResult<LandPlot> {
        self.patch_admin_json(
            &format!("/admin/plots/{}/visibility", plot_id),
            &json!({ "is_visible": visible }),
        )
        .await
    }

    pub async fn delete_plot(&self, plot_id: i64) -> ApiResult<()> {
        self.delete_admin(&format!("/admin/plots/{}", plot_id))
            .await
    }

    /// Admin listing: same filters as the public catalog, but hidden
    /// plots are included.
    pub async fn admin_list_plots(&self, query: &PlotQuery) -> ApiResult<Vec<LandPlot>> {
        self.get_admin_query_json("/admin/plots", query).await
    }

    pub async fn admin_plot_count(&self, query: &PlotQuery) -> ApiResult<PlotCount> {
        self.get_admin_query_json("/admin/plots/count", query).await
    }

    /// Like [`get_plot`](Self::get_plot) but sees hidden plots too.
    pub async fn admin_get_plot(&self, plot_id: i64) -> ApiResult<LandPlot> {
        self.get_admin_json(&format!("/admin/plots/{}", plot_id))
            .await
    }
}
