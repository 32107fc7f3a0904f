use dining_nutrition::utils::validation::Validate;
use dining_nutrition::{ExportFormat, Exporter, LocalStorage, NutritionConfig, NutritionService};
use httpmock::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const MENU: &str = r#"<table>
    <tr><th>Item</th><th>Serving Size</th><th>Calories</th><th>Total Fat</th><th>Protein</th></tr>
    <tr><td>Cheese Pizza</td><td>1 slice</td><td>285</td><td>10g</td><td>12g</td></tr>
    <tr><td>Caesar Salad</td><td>1 bowl</td><td>190</td><td>15g</td><td>7g</td></tr>
</table>"#;

/// Each test uses its own variable since tests share the process environment.
fn write_config(host_var: &str, base_url: &str) -> NamedTempFile {
    std::env::set_var(host_var, base_url);

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[fetch]
timeout_seconds = 5
min_delay_ms = 0

[[venues]]
key = "hampshire"
display_name = "Hampshire Dining Commons"
category = "dining_commons"
menu_source_ref = "${{{host_var}}}/hampshire"

[[venues]]
key = "tavola"
display_name = "Tavola"
category = "eatery"
menu_source_ref = "${{{host_var}}}/tavola"
is_open = false
"#
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_config_file_to_csv_export() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/hampshire");
            then.status(200).body(MENU);
        })
        .await;

    let config_file = write_config("DINING_CSV_TEST_HOST", &server.base_url());
    let config = NutritionConfig::from_file(config_file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.venues[0].menu_source_ref, server.url("/hampshire"));

    let service = NutritionService::from_config(&config).unwrap();
    let batch = service.scrape_all(None).await;
    page.assert_async().await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.total_records(), 2);

    let output = TempDir::new().unwrap();
    let exporter = Exporter::new(LocalStorage::new(
        output.path().to_string_lossy().into_owned(),
    ));
    let path = exporter.write_batch(&batch, ExportFormat::Csv).await.unwrap();

    let csv = std::fs::read_to_string(output.path().join(path)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "hampshire,Cheese Pizza,1 slice,285,10.0,,,,,,,,12.0,false");
    assert_eq!(lines[2], "hampshire,Caesar Salad,1 bowl,190,15.0,,,,,,,,7.0,false");
}

#[tokio::test]
async fn test_search_json_export() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/hampshire");
            then.status(200).body(MENU);
        })
        .await;

    let config_file = write_config("DINING_JSON_TEST_HOST", &server.base_url());
    let config = NutritionConfig::from_file(config_file.path()).unwrap();
    let service = NutritionService::from_config(&config).unwrap();

    let report = service.search("pizza", None).await.unwrap();
    let output = TempDir::new().unwrap();
    let exporter = Exporter::new(LocalStorage::new(
        output.path().to_string_lossy().into_owned(),
    ));
    let path = exporter.write_search(&report, ExportFormat::Json).await.unwrap();
    assert_eq!(path, "search_pizza.json");

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.path().join(path)).unwrap()).unwrap();
    assert_eq!(value["query"], "pizza");
    assert_eq!(value["records"][0]["name"], "Cheese Pizza");
    assert_eq!(value["records"][0]["calories"], 285);
    assert_eq!(value["records"][0]["provenance"], "extracted");
    assert!(value["no_data"].is_null());
}
