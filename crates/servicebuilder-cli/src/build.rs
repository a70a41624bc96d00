//! Build command implementation.
//!
//! Runs the same pipeline as the server against local files.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use servicebuilder_core::{BuilderConfig, NamedPayload, ServiceBuilder};

use crate::colors;

/// Check that every input file exists.
pub fn check_inputs(pojos: &[impl AsRef<Path>], genmodel: &Path) -> anyhow::Result<()> {
    for path in pojos.iter().map(AsRef::as_ref).chain(std::iter::once(genmodel)) {
        if !path.is_file() {
            anyhow::bail!("Input not found: {}", path.display());
        }
    }
    Ok(())
}

/// Compile `pojos` against `genmodel` and write the jar to `output`.
pub fn execute(
    config: BuilderConfig,
    pojos: &[impl AsRef<Path>],
    genmodel: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut payloads = Vec::with_capacity(pojos.len() + 1);
    for pojo in pojos {
        payloads.push(NamedPayload::source(file_name(pojo.as_ref())?, read(pojo.as_ref())?));
    }
    payloads.push(NamedPayload::runtime_archive(file_name(genmodel)?, read(genmodel)?));

    let builder = ServiceBuilder::new(config);
    let jar = match builder.build(&payloads) {
        Ok(jar) => jar,
        Err(e) => {
            eprintln!("{}✗ Build failed{}", colors::RED, colors::RESET);
            if let Some(output) = e.tool_output() {
                eprintln!("{}", output);
            }
            return Err(e.into());
        }
    };

    fs::write(output, &jar).with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{}✓ Built{} {} ({} bytes) in {:.2}s",
        colors::GREEN,
        colors::RESET,
        output.display(),
        jar.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_inputs_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let genmodel = temp.path().join("h2o-genmodel.jar");
        fs::write(&genmodel, "jar").unwrap();
        let pojo = temp.path().join("Model1.java");

        let err = check_inputs(&[&pojo], &genmodel).unwrap_err();
        assert!(err.to_string().contains("Model1.java"));

        fs::write(&pojo, "class Model1 {}").unwrap();
        check_inputs(&[&pojo], &genmodel).expect("inputs exist");
    }
}
