//! Summary endpoint handler.

use arcstats_monitor::UnitMode;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{no_snapshot_response, FOOTER_TEXT, TEXT_PLAIN};
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub units: Option<String>,
}

/// Handler for the /summary endpoint.
#[instrument(skip(state))]
pub async fn summary_handler(
    State(state): State<SharedState>,
    Query(params): Query<SummaryParams>,
) -> Response {
    debug!("Processing /summary request");

    let view = state.collector.view();
    let mode = match params.units.as_deref().map(str::parse::<UnitMode>) {
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            return (StatusCode::BAD_REQUEST, [TEXT_PLAIN], format!("{e}\n")).into_response()
        }
        None => view.unit_mode(),
    };

    let Some(summary) = view.summary(mode) else {
        return no_snapshot_response().into_response();
    };

    (
        StatusCode::OK,
        [TEXT_PLAIN],
        format!(
            "{}\nHealth: {}\n\n{FOOTER_TEXT}\n",
            summary.render(),
            view.health_status()
        ),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_text, state_with_file, DUMP};

    #[tokio::test]
    async fn test_summary_line() {
        let (state, _file) = state_with_file(DUMP);
        state.collector.poll().await;

        let response = summary_handler(State(state), Query(SummaryParams::default())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.starts_with(
            "ARC Size: 1.00 GB    Hits: 1500    Misses: 100    Hit Ratio: 93.75%"
        ));
        assert!(body.contains("Health: ok"));
    }

    #[tokio::test]
    async fn test_summary_raw_units() {
        let (state, _file) = state_with_file(DUMP);
        state.collector.poll().await;
        let params = SummaryParams {
            units: Some("raw".into()),
        };
        let body = body_text(summary_handler(State(state), Query(params)).await).await;
        assert!(body.contains("ARC Size: 1073741824 B"));
    }
}
