//! Print the bridge's OpenAPI document.
//!
//! `generate_openapi [PATH]` writes the pretty-printed JSON to `PATH`, or to
//! stdout when no path is given.

use std::{
    env,
    fs::File,
    io::{self, BufWriter, Write},
};

use anyhow::{Context, Result};
use myeldom_bridge::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let doc = ApiDoc::openapi();

    match env::args_os().nth(1) {
        Some(path) => {
            let shown = path.to_string_lossy().into_owned();
            let file = File::create(&path).with_context(|| format!("cannot create {shown}"))?;
            write_doc(&doc, BufWriter::new(file))?;
            eprintln!("OpenAPI document written to {shown}");
        }
        None => write_doc(&doc, io::stdout().lock())?,
    }
    Ok(())
}

fn write_doc(doc: &utoipa::openapi::OpenApi, mut out: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, doc).context("cannot serialise OpenAPI document")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
