use std::fs;

fn main() -> anyhow::Result<()> {
    let doc = project_desk::docs::build_openapi(8000)?;
    let s = serde_json::to_string_pretty(&doc)?;
    let path = std::env::args().nth(1).unwrap_or_else(|| "/tmp/openapi-generated.json".to_string());
    fs::write(&path, s)?;
    println!("wrote {}", path);
    Ok(())
}
