//! PDF export through the `typst` compiler.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{DevisError, Result};
use crate::render::Renderer;
use crate::template::TemplateId;
use crate::view::QuoteView;

/// `devis-<number>-<template>-<YYYY-MM-DD>.pdf`
pub fn pdf_file_name(number: &str, template: TemplateId, date: NaiveDate) -> String {
    format!(
        "devis-{}-{}-{}.pdf",
        file_safe(number),
        template.id(),
        date.format("%Y-%m-%d")
    )
}

/// `devis-<number>-templates.zip`, next to the PDFs it bundles.
pub fn bundle_file_name(number: &str) -> String {
    format!("devis-{}-templates.zip", file_safe(number))
}

// Runs of unsafe characters collapse into one '-'.
pub(crate) fn file_safe(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out
}

/// Markup and images written to disk, ready for `typst compile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExport {
    pub typ_path: PathBuf,
    pub pdf_path: PathBuf,
}

pub struct PdfExporter {
    bin: String,
}

impl PdfExporter {
    pub fn new(bin: impl Into<String>) -> Self {
        PdfExporter { bin: bin.into() }
    }

    /// Check the compiler is installed before doing any work.
    pub fn ensure_available(&self) -> Result<()> {
        match Command::new(&self.bin).arg("--version").output() {
            Ok(out) if out.status.success() => {
                debug!(version = %String::from_utf8_lossy(&out.stdout).trim(), "typst found");
                Ok(())
            }
            _ => Err(DevisError::TypstMissing(self.bin.clone())),
        }
    }

    /// Write `<name>.typ` and the company images into `out_dir`.
    pub fn prepare(
        &self,
        view: &QuoteView,
        renderer: &Renderer,
        out_dir: &Path,
        date: NaiveDate,
    ) -> Result<PreparedExport> {
        fs::create_dir_all(out_dir)?;
        let pdf_path = out_dir.join(pdf_file_name(&view.number, view.template, date));
        let typ_path = pdf_path.with_extension("typ");
        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        // Images are prefixed so several quotes can share one folder.
        let mut view = view.clone();
        for image in [view.company.logo.as_mut(), view.company.signature.as_mut()]
            .into_iter()
            .flatten()
        {
            image.file_name = format!("{}-{}", stem, image.file_name);
            fs::write(out_dir.join(&image.file_name), &image.bytes)?;
        }

        fs::write(&typ_path, renderer.render_typst(&view)?)?;
        Ok(PreparedExport { typ_path, pdf_path })
    }

    pub fn compile(&self, prepared: &PreparedExport) -> Result<()> {
        let output = Command::new(&self.bin)
            .arg("compile")
            .arg(&prepared.typ_path)
            .arg(&prepared.pdf_path)
            .output()?;
        if !output.status.success() {
            return Err(DevisError::TypstFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        info!(pdf = %prepared.pdf_path.display(), "PDF generated");
        Ok(())
    }

    pub fn export(
        &self,
        view: &QuoteView,
        renderer: &Renderer,
        out_dir: &Path,
        date: NaiveDate,
    ) -> Result<PathBuf> {
        self.ensure_available()?;
        let prepared = self.prepare(view, renderer, out_dir, date)?;
        self.compile(&prepared)?;
        Ok(prepared.pdf_path)
    }

    /// Export several views of one quote, checking for the compiler once.
    pub fn export_all(
        &self,
        views: &[QuoteView],
        renderer: &Renderer,
        out_dir: &Path,
        date: NaiveDate,
    ) -> Result<Vec<PathBuf>> {
        self.ensure_available()?;
        let mut pdfs = Vec::with_capacity(views.len());
        for view in views {
            let prepared = self.prepare(view, renderer, out_dir, date)?;
            self.compile(&prepared)?;
            pdfs.push(prepared.pdf_path);
        }
        Ok(pdfs)
    }
}

/// Zip the given files, flat, into `archive`.
pub fn bundle(paths: &[PathBuf], archive: &Path) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| DevisError::Config(format!("not a file: {}", path.display())))?;
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(path)?)?;
    }
    zip.finish()?;
    Ok(())
}
