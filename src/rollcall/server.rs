//! The read-only HTTP API over the vote table.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use snafu::prelude::*;

use crate::rollcall::store::VoteStore;
use crate::rollcall::*;

pub type SharedStore = Arc<VoteStore>;

// The methods allowed by default to cross-origin callers.
const CORS_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Any failure while answering a request. The details only go to the log.
#[derive(Debug)]
pub struct ApiError(RollcallError);

impl From<RollcallError> for ApiError {
    fn from(e: RollcallError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{}", error_chain(&self.0));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal Server Error" })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// rusqlite blocks: the queries run on the blocking pool.
async fn run_query<T, F>(store: SharedStore, f: F) -> ApiResult<T>
where
    F: FnOnce(&VoteStore) -> RollcallResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let res = tokio::task::spawn_blocking(move || f(&store))
        .await
        .context(QueryTaskSnafu {})?;
    Ok(Json(res?))
}

async fn top10(State(store): State<SharedStore>) -> ApiResult<Vec<DissentReport>> {
    run_query(store, |s| {
        Ok(build_dissent_report(s.top_dissent(TOP_DISSENT_LIMIT)?))
    })
    .await
}

async fn members(State(store): State<SharedStore>) -> ApiResult<Vec<MemberSummary>> {
    run_query(store, |s| s.distinct_members()).await
}

async fn member_detail(
    State(store): State<SharedStore>,
    Path(mitglied): Path<String>,
) -> ApiResult<Vec<StoredVoteRecord>> {
    run_query(store, move |s| s.records_by_bezeichnung(&mitglied)).await
}

async fn groups(State(store): State<SharedStore>) -> ApiResult<Vec<Option<String>>> {
    run_query(store, |s| s.distinct_groups()).await
}

async fn group_members(
    State(store): State<SharedStore>,
    Path(fraktiongruppe): Path<String>,
) -> ApiResult<Vec<GroupMember>> {
    run_query(store, move |s| s.group_members(&fraktiongruppe)).await
}

// TODO: the member segment is not applied as a filter, this answers with the
// whole group. Decide with the frontend whether it should filter on the name.
async fn group_member_detail(
    State(store): State<SharedStore>,
    Path((fraktiongruppe, _mitglied)): Path<(String, String)>,
) -> ApiResult<Vec<GroupMember>> {
    run_query(store, move |s| s.group_members(&fraktiongruppe)).await
}

/// Lets any origin call the API, and answers the preflight requests.
async fn allow_any_origin(req: Request, next: Next) -> Response {
    let any = HeaderValue::from_static("*");
    if req.method() == Method::OPTIONS {
        let mut res = StatusCode::NO_CONTENT.into_response();
        let headers = res.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, any);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_METHODS),
        );
        if let Some(requested) = req.headers().get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            headers.insert(
                header::VARY,
                HeaderValue::from_static("Access-Control-Request-Headers"),
            );
        }
        return res;
    }
    let mut res = next.run(req).await;
    res.headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, any);
    res
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/data/top10", get(top10))
        .route("/mitglieder", get(members))
        .route("/mitglieder/", get(members))
        .route("/mitglieder/:mitglied", get(member_detail))
        .route("/fraktiongruppe", get(groups))
        .route("/fraktiongruppe/", get(groups))
        .route(
            "/fraktiongruppe/:fraktiongruppe/mitglieder",
            get(group_members),
        )
        .route(
            "/fraktiongruppe/:fraktiongruppe/mitglieder/:mitglied",
            get(group_member_detail),
        )
        .layer(middleware::from_fn(allow_any_origin))
        .with_state(store)
}

pub async fn serve(store: SharedStore, addr: SocketAddr) -> RollcallResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(BindingSnafu {
            addr: addr.to_string(),
        })?;
    info!("Server is running on http://{}", addr);
    axum::serve(listener, router(store))
        .await
        .context(ServingSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JSValue;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn record(name: &str, group: &str, bezeichnung: &str, bemerkung: &str, outcome: [i64; 5]) -> VoteRecord {
        VoteRecord {
            wahlperiode: Some(20),
            sitzungnr: Some(110),
            abstimmnr: Some(2),
            fraktion_gruppe: Some(group.to_string()),
            name: Some(name.to_string()),
            vorname: Some("Vorname".to_string()),
            titel: Some("".to_string()),
            ja: Some(outcome[0]),
            nein: Some(outcome[1]),
            enthaltung: Some(outcome[2]),
            ungueltig: Some(outcome[3]),
            nichtabgegeben: Some(outcome[4]),
            bezeichnung: Some(bezeichnung.to_string()),
            bemerkung: Some(bemerkung.to_string()),
            datum: Some("15.06.2023".to_string()),
        }
    }

    fn sample_store() -> SharedStore {
        let store = VoteStore::open_in_memory().unwrap();
        store
            .insert_records(&[
                record("Muster", "SPD", "Antrag A", "", [1, 0, 0, 0, 0]),
                record("Beispiel", "SPD", "Antrag A", "", [0, 0, 1, 0, 0]),
                record("Schulz", "FDP", "Antrag A", "", [0, 0, 0, 0, 1]),
                record("Muster", "SPD", "Antrag B", "Nachtrag", [0, 0, 0, 0, 1]),
                record("Schulz", "FDP", "Antrag B", "Nachtrag", [0, 1, 0, 0, 0]),
            ])
            .unwrap();
        Arc::new(store)
    }

    async fn body_json(res: Response) -> JSValue {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn top10_uses_remark_in_key() {
        let res = top10(State(sample_store())).await.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        let js = body_json(res).await;
        let entries = js.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["bezeichnung"], json!("Antrag A"));
        assert_eq!(entries[0]["enthaltung"], json!(1));
        assert_eq!(entries[0]["nichtabgegeben"], json!(1));
        assert_eq!(entries[1]["bezeichnung"], json!("Antrag B"));
        assert_eq!(entries[1]["nichtabgegeben (Nachtrag)"], json!(1));
        assert!(entries[1].get("nichtabgegeben").is_none());
    }

    #[tokio::test]
    async fn member_detail_returns_full_rows() {
        let res = member_detail(State(sample_store()), Path("Antrag B".to_string()))
            .await
            .into_response();
        let js = body_json(res).await;
        let rows = js.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        for key in ["id", "Wahlperiode", "FraktionGruppe", "ungültig", "Datum", "createdAt", "updatedAt"] {
            assert!(rows[0].get(key).is_some(), "missing {}", key);
        }
        assert_eq!(rows[0]["Bemerkung"], json!("Nachtrag"));
    }

    #[tokio::test]
    async fn group_listings() {
        let store = sample_store();
        let js = body_json(groups(State(store.clone())).await.into_response()).await;
        let mut names: Vec<String> = js
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["FDP".to_string(), "SPD".to_string()]);

        let js = body_json(members(State(store.clone())).await.into_response()).await;
        assert_eq!(js.as_array().unwrap().len(), 3);

        let js = body_json(
            group_members(State(store), Path("SPD".to_string()))
                .await
                .into_response(),
        )
        .await;
        // Muster/Antrag A, Beispiel/Antrag A, Muster/Antrag B
        assert_eq!(js.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn member_segment_does_not_filter() {
        let store = sample_store();
        let whole = body_json(
            group_members(State(store.clone()), Path("SPD".to_string()))
                .await
                .into_response(),
        )
        .await;
        let detail = body_json(
            group_member_detail(
                State(store),
                Path(("SPD".to_string(), "Nobody".to_string())),
            )
            .await
            .into_response(),
        )
        .await;
        assert_eq!(whole, detail);
    }

    #[tokio::test]
    async fn storage_failure_is_a_generic_500() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("main.db");
        let store = Arc::new(VoteStore::open(&db).unwrap());
        rusqlite::Connection::open(&db)
            .unwrap()
            .execute_batch(r#"DROP TABLE "ExcelData""#)
            .unwrap();

        let res = top10(State(store)).await.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(res).await,
            json!({ "error": "Internal Server Error" })
        );
    }

    async fn raw_request(addr: SocketAddr, method: &str, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let req = format!(
            "{} {} HTTP/1.1\r\nHost: localhost\r\nOrigin: http://example.org\r\nConnection: close\r\n\r\n",
            method, path
        );
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    #[tokio::test]
    async fn routes_answer_with_cors_header() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(sample_store());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        for path in [
            "/data/top10",
            "/mitglieder/",
            "/mitglieder",
            "/mitglieder/Antrag%20A",
            "/fraktiongruppe/",
            "/fraktiongruppe/SPD/mitglieder",
            "/fraktiongruppe/SPD/mitglieder/Muster",
        ] {
            let res = raw_request(addr, "GET", path).await;
            assert!(res.starts_with("HTTP/1.1 200"), "{}: {}", path, res);
            assert!(
                res.to_ascii_lowercase()
                    .contains("access-control-allow-origin: *"),
                "{}: {}",
                path,
                res
            );
        }

        let res = raw_request(addr, "GET", "/mitglieder/Antrag%20A").await;
        assert!(res.contains("\"Bezeichnung\":\"Antrag A\""));

        let res = raw_request(addr, "OPTIONS", "/data/top10").await;
        assert!(res.starts_with("HTTP/1.1 204"), "{}", res);

        let res = raw_request(addr, "GET", "/unbekannt").await;
        assert!(res.starts_with("HTTP/1.1 404"), "{}", res);
    }
}
