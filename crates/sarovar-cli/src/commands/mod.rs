//! Command implementations

mod config;
mod doctor;
mod interactive;
mod modules;
mod resolve;
mod run;

use crate::cli::{Cli, Commands, RoiArgs};
use crate::errors;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use crate::progress::{create_spinner, finish_error, finish_success};
use sarovar_core::models::RegionTag;
use sarovar_geo::RoiInput;
use sarovar_session::{Orchestrator, SessionError};
use std::path::Path;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match &cli.command {
        Commands::Modules(args) => modules::execute(args, &output),
        Commands::Resolve(args) => resolve::execute(&cli, args, &output),
        Commands::Run(args) => run::execute(&cli, args, &output),
        Commands::Interactive(args) => interactive::execute(&cli, args, &output),
        Commands::Config => config::execute(&cli, &output),
        Commands::Doctor(args) => doctor::execute(&cli, args, &output),
    }
}

/// Turn the ROI flags into resolver input
pub(crate) fn roi_input(args: &RoiArgs, radius_m: f64) -> Result<RoiInput> {
    if let Some(path) = &args.boundary {
        let content = std::fs::read(path).map_err(|e| {
            errors::boundary_file_unreadable(&path.display().to_string(), &e.to_string())
        })?;
        return Ok(RoiInput::boundary_file(content));
    }

    if let Some(point) = &args.point {
        let (lat, lon) = parse_point(point)?;
        return Ok(RoiInput::point_buffer(lat, lon, radius_m));
    }

    if let Some(shape) = &args.shape {
        let text = if Path::new(shape).is_file() {
            std::fs::read_to_string(shape).with_context(|| format!("Failed to read {}", shape))?
        } else {
            shape.clone()
        };
        let value = serde_json::from_str(&text).context("Shape is not valid GeoJSON")?;
        return Ok(RoiInput::drawn_shape(value));
    }

    anyhow::bail!("No ROI given. Use --boundary, --point or --shape")
}

/// Resolve, classify and lock the ROI behind a spinner
pub(crate) fn lock_roi(session: &mut Orchestrator, input: &RoiInput, output: &OutputWriter) -> Result<RegionTag> {
    let spinner = create_spinner("Resolving region of interest...", output.is_json());
    match session.submit_roi(input) {
        Ok(region) => {
            finish_success(&spinner, &format!("Region of interest locked ({})", region.label()));
            Ok(region)
        }
        Err(SessionError::Core(e)) => {
            finish_error(&spinner, "Region of interest rejected");
            Err(errors::roi_rejected(input.mode_name(), &e.to_string()).into())
        }
        Err(e) => {
            finish_error(&spinner, "Region of interest rejected");
            Err(e.into())
        }
    }
}

/// Parse "lat,lon"
pub(crate) fn parse_point(s: &str) -> Result<(f64, f64)> {
    let parse = |part: Option<&str>| part.and_then(|p| p.trim().parse::<f64>().ok());
    let mut parts = s.split(',');
    match (parse(parts.next()), parse(parts.next()), parts.next()) {
        (Some(lat), Some(lon), None) => Ok((lat, lon)),
        _ => anyhow::bail!("Invalid point '{}'. Use LAT,LON, e.g. 26.3,73.0", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("26.3,73.0").unwrap(), (26.3, 73.0));
        assert_eq!(parse_point(" -12.5 , 130 ").unwrap(), (-12.5, 130.0));
        assert!(parse_point("26.3").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_point("1,2,3").is_err());
    }

    #[test]
    fn test_roi_input_modes() {
        let args = RoiArgs { point: Some("26.3,73.0".to_string()), ..Default::default() };
        assert_eq!(roi_input(&args, 500.0).unwrap(), RoiInput::point_buffer(26.3, 73.0, 500.0));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<kml><coordinates>1,1 2,1 2,2 1,1</coordinates></kml>").unwrap();
        let args = RoiArgs { boundary: Some(file.path().to_path_buf()), ..Default::default() };
        assert!(matches!(roi_input(&args, 0.0).unwrap(), RoiInput::BoundaryFile { .. }));

        let args = RoiArgs { shape: Some(r#"{"type":"Point","coordinates":[73,26]}"#.to_string()), ..Default::default() };
        assert!(matches!(roi_input(&args, 0.0).unwrap(), RoiInput::DrawnShape { .. }));

        let args = RoiArgs { boundary: Some("/nonexistent/area.kml".into()), ..Default::default() };
        assert!(roi_input(&args, 0.0).is_err());
    }
}
