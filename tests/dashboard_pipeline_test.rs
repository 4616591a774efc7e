//! End-to-end test: CSV files on disk → loaded dataset → HTTP dashboard API.
//!
//! Each test writes its fixtures into a temporary data directory, serves the
//! full router on a random port and queries it with `reqwest`.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use ssr_dashboard::config::{AppConfig, DataConfig};
use ssr_dashboard::loader::Dataset;
use ssr_dashboard::{routes, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

const INDICATORS: &str = "\
Municipio,Categoría,Indicador,Valor (%),Meta (%),Año
Popayán,Materno,CPN Precoz,92,90,2024
Popayán,Materno,Parto Institucional,75,90,2024
Popayán,Materno,Tamizaje VIH,50,,2024
Popayán,Violencia Sexual,Atención integral,30,80,2023
Popayán,Violencia Sexual,Atención integral,20,80,2024
Timbío,Materno,CPN Precoz,sin dato,90,2024
Timbío,Violencia Sexual,Atención integral,45,80,2024
";

const PRENATAL: &str = "\
Municipio,codigo,CPN_Precoz,CPN_Completo
Popayán,19001,92,85
Timbío,19807,70,60
";

const PREGNANT: &str = "\
Municipio,Gestantes Activas
Popayán,420
Timbío,35
";

const SYPHILIS: &str = "\
evento,municipio,eps,semana,casos,fecha_notif
Sífilis Congénita,Timbío,Emssanar,3,2,2024-01-20
Sífilis Congénita,Timbío,Asmet,1,1,2024-01-05
Sífilis Gestacional,Popayán,Nueva EPS,1,5,2024-01-04
Sífilis Congénita,Timbío,Emssanar,2,4,2024-01-12
Sífilis Congénita,Timbío,Emssanar,3,1,2024-01-19
";

fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in [
        ("indicadores.csv", INDICATORS),
        ("cpn.csv", PRENATAL),
        ("gestantes.csv", PREGNANT),
        ("sifilis.csv", SYPHILIS),
    ] {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn data_config(dir: &TempDir) -> DataConfig {
    DataConfig {
        indicators_file: "indicadores.csv".to_string(),
        prenatal_file: "cpn.csv".to_string(),
        pregnant_file: "gestantes.csv".to_string(),
        syphilis_file: "sifilis.csv".to_string(),
        ..DataConfig::with_dir(dir.path())
    }
}

/// Load `data` and serve the router on a random port, returning the base URL.
async fn start_server(data: DataConfig) -> String {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        frontend_url: "http://localhost:5173".to_string(),
        data,
    };
    let dataset = Dataset::load(&config.data);
    let state = AppState {
        data: Arc::new(dataset),
        config,
    };
    let app = routes::router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}")
}

/// Helper: extract `data` from the API envelope, panic with message on error.
async fn get_data(client: &Client, url: String) -> Value {
    let resp = client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "GET {url}");
    let body: Value = resp.json().await.unwrap();
    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        panic!("API error on {url}: {err}");
    }
    body["data"].clone()
}

#[tokio::test]
async fn full_dashboard_pipeline() {
    let dir = data_dir();
    let base = start_server(data_config(&dir)).await;
    let client = Client::new();

    // 1. Health
    let resp = client.get(format!("{base}/health/live")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ready = get_data(&client, format!("{base}/health/ready")).await;
    let sources = ready["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 5);
    assert_eq!(sources[0]["origin"], "file");
    assert_eq!(sources[0]["rows"], 7);
    assert_eq!(sources[0]["parse_failures"], 1);
    // Only the boundary layer is absent.
    assert_eq!(ready["degraded"], 1);

    // 2. Controls
    let controls = get_data(&client, format!("{base}/api/v1/controls")).await;
    assert_eq!(controls["municipios"], serde_json::json!(["Popayán", "Timbío"]));
    assert_eq!(
        controls["cpn_indicadores"],
        serde_json::json!(["CPN_Precoz", "CPN_Completo"])
    );
    assert_eq!(controls["sifilis"][1]["eps"], serde_json::json!(["Asmet", "Emssanar"]));
    assert_eq!(
        controls["violencia_municipios"],
        serde_json::json!(["Popayán", "Timbío"])
    );
    let defaults = &controls["defaults"];
    assert_eq!(defaults["categoria"], "Materno");
    assert_eq!(defaults["tipo"], "Barras");
    assert_eq!(defaults["semaforo_municipio"], "Popayán");
    assert_eq!(defaults["gestantes_indicador"], "Gestantes Activas");

    // 3. KPIs
    let kpis = get_data(&client, format!("{base}/api/v1/kpis")).await;
    assert_eq!(kpis["cards"][0]["display"], "92.0%");
    assert_eq!(kpis["cards"][1]["display"], "75.0%");
    assert_eq!(kpis["cards"][2]["display"], "3");
    assert_eq!(kpis["cards"][3]["display"], "2");

    // 4. CPN summary for Popayán
    let cpn = get_data(
        &client,
        format!("{base}/api/v1/cpn?municipio=Popay%C3%A1n&vista=resumen"),
    )
    .await;
    assert_eq!(cpn["kind"], "cards");
    assert_eq!(cpn["cards"][0]["title"], "Cpn Precoz");
    assert_eq!(cpn["cards"][0]["display"], "92.0%");
    assert_eq!(cpn["cards"][0]["tier"], "high");

    // 5. CPN heat map orders municipalities by value
    let heat = get_data(
        &client,
        format!("{base}/api/v1/cpn?vista=mapa_calor&indicador=CPN_Completo"),
    )
    .await;
    assert_eq!(heat["kind"], "heat_bar");
    assert_eq!(heat["bars"][0]["label"], "Popayán");
    assert_eq!(heat["bars"][1]["label"], "Timbío");

    // 6. Semáforo
    let semaforo = get_data(
        &client,
        format!("{base}/api/v1/semaforo?municipio=Popay%C3%A1n"),
    )
    .await;
    assert_eq!(semaforo["kind"], "table");
    let rows = semaforo["rows"].as_array().unwrap();
    assert_eq!(rows[0]["cells"][3], "🟢 Cumple");
    assert_eq!(rows[1]["cells"][3], "🟡 Parcial");
    assert_eq!(rows[2]["cells"][2], 90.0);
    assert_eq!(rows[2]["cells"][3], "🔴 No cumple");
    assert_eq!(semaforo["page_size"], 15);

    // 7. Category chart
    let chart = get_data(
        &client,
        format!("{base}/api/v1/categoria?categoria=Materno&municipio=Popay%C3%A1n&tipo=Pastel"),
    )
    .await;
    assert_eq!(chart["kind"], "chart");
    assert_eq!(chart["chart_type"], "pie");
    assert_eq!(chart["points"].as_array().unwrap().len(), 3);

    // 8. Violence trend by year
    let trend = get_data(
        &client,
        format!("{base}/api/v1/violencia?municipio=Popay%C3%A1n&vista=tendencia"),
    )
    .await;
    assert_eq!(trend["points"][0]["label"], "2023");
    assert_eq!(trend["points"][0]["value"], 30.0);
    assert_eq!(trend["points"][1]["label"], "2024");

    // 9. Violence map falls back to heat bar without boundaries
    let map = get_data(&client, format!("{base}/api/v1/violencia/mapa")).await;
    assert_eq!(map["kind"], "heat_bar");
    assert_eq!(map["bars"][0]["label"], "Timbío");

    // 10. Pregnant women
    let pregnant = get_data(&client, format!("{base}/api/v1/gestantes")).await;
    assert_eq!(pregnant["bars"][0]["value"], 420.0);

    // 11. Syphilis weekly cases, ascending weeks
    let syphilis = get_data(
        &client,
        format!("{base}/api/v1/sifilis?tab=congenita&municipio=Timb%C3%ADo"),
    )
    .await;
    let weeks: Vec<&str> = syphilis["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["label"].as_str().unwrap())
        .collect();
    assert_eq!(weeks, vec!["1", "2", "3"]);
    assert_eq!(syphilis["points"][2]["value"], 3.0);

    // 12. Unmatched selections are alerts, not errors
    let alert = get_data(
        &client,
        format!("{base}/api/v1/semaforo?municipio=Inz%C3%A1"),
    )
    .await;
    assert_eq!(alert["kind"], "alert");
    assert_eq!(alert["message"], "No hay datos para Inzá");

    // 13. Invalid controls are rejected
    let resp = client
        .get(format!("{base}/api/v1/violencia?vista=mensual"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_data_dir_serves_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let base = start_server(DataConfig::with_dir(dir.path())).await;
    let client = Client::new();

    let ready = get_data(&client, format!("{base}/health/ready")).await;
    assert_eq!(ready["degraded"], 5);

    // CPN keeps working on its placeholder table.
    let cpn = get_data(&client, format!("{base}/api/v1/cpn")).await;
    assert_eq!(cpn["kind"], "cards");
    assert_eq!(cpn["cards"].as_array().unwrap().len(), 4);

    let syphilis = get_data(&client, format!("{base}/api/v1/sifilis")).await;
    assert_eq!(syphilis["kind"], "alert");
    assert_eq!(syphilis["level"], "warning");
    assert_eq!(syphilis["message"], "No hay datos de sífilis disponibles");
}
