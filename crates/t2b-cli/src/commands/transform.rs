//! `t2b transform`: rewrite test classes into benchmark classes.

use super::files::{collect_class_files, internal_name};
use crate::output::{resolve_color_choice, Style, StyledOutput};
use std::path::PathBuf;
use t2b_transform::settings::SUFFIX_PROPERTY;
use t2b_transform::{default_classifiers, Classifier, LoadPath, Session, SessionReport, TransformSettings};

pub struct TransformOptions {
    pub classes: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub out: PathBuf,
    pub define: Vec<String>,
    pub config: Option<PathBuf>,
    pub suffix: Option<String>,
    pub json: bool,
    pub color: Option<String>,
}

pub fn execute(options: TransformOptions) -> anyhow::Result<()> {
    let mut properties = super::system_properties(options.define, options.config)?;
    if let Some(suffix) = options.suffix {
        properties.set(SUFFIX_PROPERTY, suffix);
    }
    let settings = TransformSettings::from_properties(&properties, &options.out);
    let config = settings.resolution_config();

    let mut load_path = LoadPath::new();
    load_path.add_root(&options.classes)?;
    for root in &options.classpath {
        load_path.add_root(root)?;
    }

    let classifiers = default_classifiers();
    let classifiers: Vec<&dyn Classifier> = classifiers.iter().map(|c| c.as_ref() as &dyn Classifier).collect();
    let session = Session::new(&load_path, &settings, &config, &properties);

    let mut reports = Vec::new();
    let mut load_failures = Vec::new();
    for file in collect_class_files(&options.classes)? {
        let Some(name) = internal_name(&options.classes, &file) else {
            tracing::warn!("Skipping {}: not a valid class path", file.display());
            continue;
        };
        // Nested units travel with their host; earlier output is not re-transformed
        let simple = name.rsplit('/').next().unwrap_or(&name);
        if simple.contains('$') || simple.ends_with(&settings.suffix) {
            tracing::debug!(class = %name, "Skipping class");
            continue;
        }

        match load_path.load(&name) {
            Ok(unit) => {
                let outcome = session.run(unit, &classifiers);
                if !outcome.report.altered {
                    continue;
                }
                reports.push(outcome.report);
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", file.display(), e);
                load_failures.push(name);
            }
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&reports, &load_failures, &settings, options.color.as_deref());
    }

    Ok(())
}

fn print_summary(reports: &[SessionReport], load_failures: &[String], settings: &TransformSettings, color: Option<&str>) {
    let mut out = StyledOutput::new(resolve_color_choice(color));

    for report in reports {
        out.write(Style::Heading, &report.unit)
            .write(Style::Muted, " -> ")
            .write(Style::Plain, &report.output)
            .newline();
        for benchmark in &report.benchmarks {
            out.item(Style::Added, "benchmark", benchmark);
        }
        for lifecycle in report.setup.iter().chain(&report.teardown) {
            out.item(Style::Muted, "lifecycle", lifecycle);
        }
        for skipped in &report.skipped {
            out.item(Style::Skipped, "skipped", &format!("{} ({})", skipped.member, skipped.reason));
        }
        if report.failures > 0 {
            out.write(Style::Failed, &format!("  {} annotation(s) failed", report.failures))
                .newline();
        }
    }

    let benchmarks: usize = reports.iter().map(|r| r.benchmarks.len()).sum();
    out.newline()
        .write(Style::Added, &format!("{} class(es), {} benchmark(s)", reports.len(), benchmarks))
        .write(Style::Plain, &format!(" written to {}", settings.output_dir.display()))
        .newline();
    if !load_failures.is_empty() {
        out.write(Style::Failed, &format!("{} class(es) could not be loaded", load_failures.len()))
            .newline();
    }
    out.flush();
}
