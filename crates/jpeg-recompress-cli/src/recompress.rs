//! Recompress command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use jpeg_recompress::{
    Candidate, Decision, JpegCodec, RecompressReport, RecompressSession, SearchConfig, SourceImage,
};

use crate::Cli;

pub fn run(cli: &Cli) -> Result<()> {
    check_paths(&cli.src, &cli.dest, cli.force)?;

    let config = SearchConfig::builder()
        .min_quality(cli.min_quality)
        .max_quality(cli.max_quality)
        .target(cli.target)
        .max_attempts(cli.loops)
        .allow_fallback_copy(!cli.no_copy)
        .build()
        .context("Invalid options")?;

    let source = SourceImage::load(&cli.src)
        .with_context(|| format!("Failed to load {}", cli.src.display()))?;
    println!("Original Size = {:.2}KB", kb(source.file_size));

    let session = RecompressSession::with_ssim(config, JpegCodec::new())?;
    let result = session
        .run(&source)
        .with_context(|| format!("Failed to recompress {}", cli.src.display()))?;

    print_report(&result.report);

    result
        .write_to(&cli.dest)
        .with_context(|| format!("Failed to write {}", cli.dest.display()))?;

    if let Some(path) = &cli.report {
        save_report(&result.report, path)?;
    }

    Ok(())
}

/// Write the report as JSON, or CSV when `path` ends in `.csv`.
pub fn save_report(report: &RecompressReport, path: &Path) -> Result<()> {
    report
        .write(path)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), "report saved");
    Ok(())
}

/// Reject missing sources and refuse to clobber an existing destination
/// unless forced.
pub fn check_paths(src: &Path, dest: &Path, force: bool) -> Result<()> {
    if !src.exists() {
        bail!("Source image {} does not exist", src.display());
    }
    if dest.as_os_str().is_empty() {
        bail!("No destination given");
    }
    if dest.exists() && !force {
        bail!(
            "Destination {} already exists, use -f to overwrite",
            dest.display()
        );
    }
    Ok(())
}

fn print_report(report: &RecompressReport) {
    for attempt in &report.attempts {
        let c = &attempt.candidate;
        println!(
            "[{}] Quality = {}, SSIM = {:.5}, Size = {:.2}KB",
            attempt.attempt,
            c.quality,
            c.index,
            kb(c.size)
        );
    }

    match report.decision {
        Decision::EncodeBest(best) => print_final(&best, report),
        Decision::NoMatch => println!("* Can't find any match, not saving any image"),
        Decision::CopySource => println!("* Can't find any match, copying original image"),
        Decision::EncodeFallback(fallback) => {
            println!("* Can't find any match, falling back to closest match");
            print_final(&fallback, report);
        }
    }
}

fn print_final(candidate: &Candidate, report: &RecompressReport) {
    println!(
        "Final image:\nQuality = {}, SSIM = {:.5}, Size = {:.2}KB",
        candidate.quality,
        candidate.index,
        kb(candidate.size)
    );
    if let (Some(percent), Some(saved)) = (report.percent_of_original(), report.saved_bytes()) {
        println!(
            "{:.1}% of original, saved {:.2}KB",
            percent,
            saved as f64 / 1024.0
        );
    }
}

fn kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_paths(&dir.path().join("nope.jpg"), &dir.path().join("out.jpg"), false)
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_existing_destination_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.jpg");
        let dest = dir.path().join("out.jpg");
        std::fs::write(&src, b"x").unwrap();
        std::fs::write(&dest, b"y").unwrap();

        assert!(check_paths(&src, &dest, false).is_err());
        assert!(check_paths(&src, &dest, true).is_ok());
    }

    #[test]
    fn test_empty_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.jpg");
        std::fs::write(&src, b"x").unwrap();
        assert!(check_paths(&src, Path::new(""), false).is_err());
    }

    #[test]
    fn test_save_report_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceImage::from_parts(
            "gray.png",
            jpeg_recompress::ImageData::Gray8(imgref::ImgVec::new(vec![128; 16 * 16], 16, 16)),
            30_000,
            false,
        );
        let session =
            RecompressSession::with_ssim(SearchConfig::default(), JpegCodec::new()).unwrap();
        let result = session.run(&source).unwrap();

        let path = dir.path().join("reports").join("gray.json");
        save_report(&result.report, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"attempts\""));
    }

    #[test]
    fn test_kb() {
        assert!((kb(2048) - 2.0).abs() < f64::EPSILON);
    }
}
