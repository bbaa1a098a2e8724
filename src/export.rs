//! Export of a finished scene: JSON, standalone HTML, or a raster/vector image.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{PlotError, Result};
use crate::models::Scene;
use crate::options::ExportOptions;
use crate::render;

/// plotly.js build the HTML documents load.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Output format, picked from the file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
    Png,
    Jpeg,
    Bmp,
    Svg,
}

impl Format {
    /// Case-insensitive suffix lookup. Unknown or missing suffixes are
    /// [`PlotError::UnsupportedFormat`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        Ok(match ext.as_str() {
            "html" | "htm" => Format::Html,
            "json" => Format::Json,
            "png" => Format::Png,
            "jpg" | "jpeg" => Format::Jpeg,
            "bmp" => Format::Bmp,
            "svg" => Format::Svg,
            _ => {
                return Err(PlotError::UnsupportedFormat(if ext.is_empty() {
                    path.display().to_string()
                } else {
                    format!(".{ext}")
                }));
            }
        })
    }

    pub fn is_raster(self) -> bool {
        !matches!(self, Format::Html | Format::Json)
    }
}

/// Standalone HTML document that draws the scene with plotly.js.
pub fn to_html(scene: &Scene) -> Result<String> {
    let data = serde_json::to_string(&scene.data)?;
    let layout = serde_json::to_string(&scene.layout)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="plot"></div>
<script>
Plotly.newPlot("plot", {data}, {layout}, {{"responsive": true}});
</script>
</body>
</html>
"#
    ))
}

/// Write `scene` to `path` in the format its suffix names.
pub fn save(scene: &Scene, path: &Path, opts: ExportOptions) -> Result<()> {
    let format = Format::from_path(path)?;
    debug!("exporting {} traces as {:?}", scene.data.len(), format);
    match format {
        Format::Html => fs::write(path, to_html(scene)?)?,
        Format::Json => fs::write(path, scene.to_json_pretty()?)?,
        _ => render::render_file(scene, path, format, opts)?,
    }
    Ok(())
}

impl Scene {
    /// Read a scene previously written as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Scene> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(Scene::from_json(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>, opts: ExportOptions) -> Result<()> {
        save(self, path.as_ref(), opts)
    }
}
