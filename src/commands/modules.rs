use anyhow::Result;
use enginedist::{
    bundle_modules, ApiVersions, BundleReport, BundleRequest, DistributionManifest,
    EngineHeaders, HttpModuleIndex, ProfileMergeMode, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub struct ModulesArgs {
    pub dist_key: String,
    pub engine_folder: PathBuf,
    pub target_dir: PathBuf,
    pub profile: PathBuf,
    pub manifest: PathBuf,
    pub dedupe_profile: bool,
    pub dry_run: bool,
}

/// Create an indicatif-based download progress callback
fn create_download_callback() -> ProgressCallback {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}")
    {
        bar.set_style(style.progress_chars("=> "));
    }

    Arc::new(move |msg: &str, current: u64, total: u64| {
        if total > 0 && bar.length() != Some(total) {
            bar.reset();
            bar.set_length(total);
        }
        bar.set_message(msg.to_string());
        bar.set_position(current);
        if total > 0 && current >= total {
            bar.finish_and_clear();
        }
    })
}

pub fn run(args: ModulesArgs) -> Result<()> {
    // Configuration and version errors must surface before anything is written
    let manifest = DistributionManifest::load(&args.manifest)?;
    manifest.find(&args.dist_key)?;
    let api_versions = ApiVersions::from_engine(&args.engine_folder, &EngineHeaders::default())?;

    let mut request = BundleRequest::new(
        args.dist_key.clone(),
        api_versions,
        args.target_dir,
        args.profile,
    );
    request.dry_run = args.dry_run;
    if args.dedupe_profile {
        request.merge_mode = ProfileMergeMode::ReplaceByName;
    }

    let source = HttpModuleIndex::new().with_progress(create_download_callback());
    let report = bundle_modules(&manifest, &request, &source)?;

    print_summary(&request, &report);
    Ok(())
}

fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

fn print_summary(request: &BundleRequest, report: &BundleReport) {
    println!();
    if !report.bundled {
        println!("Distribution '{}' bundles no modules.", request.dist_key);
        return;
    }

    if request.dry_run {
        println!("[DRY RUN] Would bundle:");
    } else {
        println!("Bundled modules:");
    }
    for bundled in &report.resolved {
        match &bundled.path {
            Some(path) => println!(
                "  ✓ {} @ {} ({} files)",
                bundled.module.name,
                bundled.module.version,
                count_files(path)
            ),
            None => println!("  {} @ {}", bundled.module.name, bundled.module.version),
        }
        for warning in &bundled.warnings {
            println!("    ⚠ {}", warning);
        }
    }

    if !report.skipped.is_empty() {
        println!();
        println!("Skipped:");
        for skipped in &report.skipped {
            let reasons: Vec<String> = skipped.warnings.iter().map(|w| w.to_string()).collect();
            println!("  ✗ {} ({})", skipped.name, reasons.join("; "));
        }
    }

    if !report.not_in_index.is_empty() {
        println!();
        println!("Not found in module index: {}", report.not_in_index.join(", "));
    }

    if !request.dry_run {
        println!();
        println!("Profile updated: {}", request.profile_path.display());
    }
}
