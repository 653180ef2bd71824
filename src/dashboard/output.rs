//! Writing the dashboard artifacts to disk.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::html::render_page;
use crate::analysis::ResultSet;
use crate::error::Result;

/// File name of the JSON result set.
pub const DATA_FILE: &str = "data.json";
/// File name of the rendered page.
pub const PAGE_FILE: &str = "index.html";

/// Paths of the files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Pretty-printed result set.
    pub data: PathBuf,
    /// Rendered dashboard page.
    pub page: PathBuf,
}

/// Write `data.json` and `index.html` into `dir`, creating it if needed.
#[instrument(skip(result), fields(dir = %dir.display(), count = result.total_count))]
pub async fn write_outputs(dir: &Path, result: &ResultSet) -> Result<OutputPaths> {
    tokio::fs::create_dir_all(dir).await?;

    let paths = OutputPaths {
        data: dir.join(DATA_FILE),
        page: dir.join(PAGE_FILE),
    };

    let json = serde_json::to_string_pretty(result)?;
    tokio::fs::write(&paths.data, json).await?;

    let html = render_page(result)?;
    tokio::fs::write(&paths.page, html).await?;

    info!(
        data = %paths.data.display(),
        page = %paths.page.display(),
        "Wrote dashboard outputs"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{filter_and_rank, FilterConfig};
    use crate::market::SAMPLE_COUNT;

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        std::env::temp_dir().join(format!("screener-{name}-{}-{nanos}", std::process::id()))
    }

    #[tokio::test]
    async fn writes_json_and_html() {
        let dir = scratch_dir("outputs").join("nested");
        let result = filter_and_rank(Vec::new(), &FilterConfig::default()).unwrap();

        let paths = write_outputs(&dir, &result).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&paths.data).await.unwrap()).unwrap();
        assert_eq!(json["totalCount"], SAMPLE_COUNT);
        assert_eq!(json["opportunities"].as_array().unwrap().len(), SAMPLE_COUNT);

        let html = tokio::fs::read_to_string(&paths.page).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(html.matches("<article class=\"card\"").count(), SAMPLE_COUNT);

        let _ = tokio::fs::remove_dir_all(dir.parent().unwrap()).await;
    }
}
