use std::path::{Path, PathBuf};

use codecover::{CatalogDb, document::NewDocument};
use rmcp::{
    ServiceExt,
    model::CallToolRequestParams,
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::json;

fn setup_fixture(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogDb::open(&data_dir.join("catalog.redb"))?;
    catalog.insert_documents(&[
        NewDocument {
            name: "Pump manual".into(),
            date: Some("2023-06-01".parse()?),
            path: "pump.pdf".into(),
            codes: vec!["AB-100, AB-200".into()],
        },
        NewDocument {
            name: "Seal sheet".into(),
            date: Some("2024-02-01".parse()?),
            path: "seal.pdf".into(),
            codes: vec!["C7".into()],
        },
    ])?;
    Ok(())
}

#[tokio::test]
async fn mcp_stdio_cover_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;

    let bin = codecover_bin()?;
    let transport = TokioChildProcess::new(
        tokio::process::Command::new(bin).configure(|cmd| {
            cmd.arg("mcp").env("CODECOVER_DATA_DIR", tempdir.path());
        }),
    )?;

    let client = ().serve(transport).await?;

    let args = json!({ "codes": "ab-100; c7 zz-9" });
    let result = client
        .peer()
        .call_tool(CallToolRequestParams::new("codecover_cover").with_arguments(args.as_object().unwrap().clone()))
        .await?;

    let structured = result.structured_content.expect("structured content");
    let selections = structured
        .get("selections")
        .and_then(|v| v.as_array())
        .expect("selections array");

    assert_eq!(selections.len(), 2);
    // Equal gain: the newer seal sheet goes first.
    assert_eq!(selections[0]["document"]["name"], "Seal sheet");
    assert_eq!(selections[1]["codesCovered"], json!(["AB-100"]));
    assert_eq!(structured["uncovered"], json!(["ZZ-9"]));

    let prefix_args = json!({ "prefix": "ab-" });
    let prefix_result = client
        .peer()
        .call_tool(CallToolRequestParams::new("codecover_prefix").with_arguments(prefix_args.as_object().unwrap().clone()))
        .await?;
    let structured = prefix_result
        .structured_content
        .expect("structured content");
    assert_eq!(structured["codes"], json!(["AB-100", "AB-200"]));

    client.cancel().await?;
    Ok(())
}

fn codecover_bin() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_codecover") {
        return Ok(PathBuf::from(bin));
    }

    let mut path = std::env::current_exe()?;
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("codecover");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    Ok(path)
}
