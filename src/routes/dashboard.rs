//! Dashboard routes: one handler per section, each answering with an artifact.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError, Notice};
use crate::models::artifact::Artifact;
use crate::routes::Selection;
use crate::services::dashboard::{self, Controls};
use crate::services::indicators::{self, CategorySelection, SemaforoSelection, ViolenceSelection};
use crate::services::prenatal::{self, CpnSelection, PregnantSelection};
use crate::services::syphilis::{self, SyphilisSelection};
use crate::AppState;

type SectionResponse = Json<ApiResponse<Artifact>>;

/// A recovered notice is still a successful response, carrying an alert.
fn respond(section: &str, result: Result<Artifact, Notice>) -> SectionResponse {
    let artifact = result.unwrap_or_else(|notice| {
        tracing::debug!(section, notice = %notice, "Section answered with alert");
        notice.into()
    });
    ApiResponse::success(artifact)
}

/// GET /api/v1/controls: option lists for every dropdown.
pub async fn controls(State(state): State<AppState>) -> Json<ApiResponse<Controls>> {
    ApiResponse::success(dashboard::controls(&state.data))
}

/// GET /api/v1/kpis: headline cards.
pub async fn kpis(State(state): State<AppState>) -> Result<SectionResponse, AppError> {
    let artifact = dashboard::kpis(&state.data)?;
    Ok(ApiResponse::success(artifact))
}

/// GET /api/v1/cpn
pub async fn cpn(
    State(state): State<AppState>,
    Selection(selection): Selection<CpnSelection>,
) -> SectionResponse {
    respond("cpn", prenatal::cpn(&state.data, &selection))
}

/// GET /api/v1/categoria
pub async fn category(
    State(state): State<AppState>,
    Selection(selection): Selection<CategorySelection>,
) -> SectionResponse {
    respond("categoria", indicators::category_chart(&state.data, &selection))
}

/// GET /api/v1/semaforo
pub async fn semaforo(
    State(state): State<AppState>,
    Selection(selection): Selection<SemaforoSelection>,
) -> SectionResponse {
    respond("semaforo", indicators::semaforo(&state.data, &selection))
}

/// GET /api/v1/violencia
pub async fn violence(
    State(state): State<AppState>,
    Selection(selection): Selection<ViolenceSelection>,
) -> SectionResponse {
    respond("violencia", indicators::sexual_violence(&state.data, &selection))
}

/// GET /api/v1/violencia/mapa
pub async fn violence_map(State(state): State<AppState>) -> SectionResponse {
    respond("violencia_mapa", indicators::violence_map(&state.data))
}

/// GET /api/v1/gestantes
pub async fn pregnant_women(
    State(state): State<AppState>,
    Selection(selection): Selection<PregnantSelection>,
) -> SectionResponse {
    respond("gestantes", prenatal::pregnant_women(&state.data, &selection))
}

/// GET /api/v1/sifilis
pub async fn syphilis(
    State(state): State<AppState>,
    Selection(selection): Selection<SyphilisSelection>,
) -> SectionResponse {
    respond("sifilis", syphilis::weekly_cases(&state.data, &selection))
}
