//! PDF export for the session presentation.
//!
//! Best-effort, used once at shutdown. On Windows this drives PowerPoint
//! through COM via PowerShell, so the PDF matches what PowerPoint itself
//! would save. Elsewhere it falls back to a headless LibreOffice
//! conversion when one is installed.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Upper bound for the converter process.
const EXPORT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error("Presentation file does not exist: {0}")]
    MissingDocument(PathBuf),

    #[error("No PDF converter available on this system")]
    Unavailable,

    #[error("Failed to launch PDF converter: {0}")]
    Launch(#[from] std::io::Error),

    #[error("PDF export timed out after {0} seconds")]
    Timeout(u64),

    #[error("PDF converter exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("PDF converter succeeded but produced no file at {0}")]
    NotProduced(PathBuf),
}

/// Convert the presentation to a PDF next to it and return the PDF path.
pub(crate) async fn export_to_pdf(pptx: &Path) -> Result<PathBuf, ExportError> {
    if !pptx.exists() {
        return Err(ExportError::MissingDocument(pptx.to_path_buf()));
    }
    let pdf = pptx.with_extension("pdf");

    let mut command = converter_command(pptx, &pdf)?;
    debug!(pptx = %pptx.display(), "Running PDF converter");

    let deadline = Duration::from_secs(EXPORT_TIMEOUT_SECS);
    let output = match tokio::time::timeout(deadline, command.output()).await {
        Ok(output) => output?,
        Err(_) => return Err(ExportError::Timeout(EXPORT_TIMEOUT_SECS)),
    };

    if !output.status.success() {
        return Err(ExportError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    if !pdf.exists() {
        return Err(ExportError::NotProduced(pdf));
    }

    info!(pdf = %pdf.display(), "PDF exported");
    Ok(pdf)
}

/// PowerPoint COM automation via PowerShell. SaveAs format 32 is
/// ppSaveAsPDF.
#[cfg(windows)]
fn converter_command(pptx: &Path, pdf: &Path) -> Result<Command, ExportError> {
    let script = format!(
        r#"$pptx = "{pptx}"
$pdf = "{pdf}"
$powerpoint = New-Object -ComObject PowerPoint.Application
$powerpoint.Visible = [Microsoft.Office.Core.MsoTriState]::msoFalse
$presentation = $powerpoint.Presentations.Open($pptx, [Microsoft.Office.Core.MsoTriState]::msoTrue, [Microsoft.Office.Core.MsoTriState]::msoFalse, [Microsoft.Office.Core.MsoTriState]::msoFalse)
$presentation.SaveAs($pdf, 32)
$presentation.Close()
$powerpoint.Quit()"#,
        pptx = pptx.display(),
        pdf = pdf.display(),
    );

    let mut command = Command::new("powershell");
    command.arg("-Command").arg(script).kill_on_drop(true);
    Ok(command)
}

/// Headless LibreOffice conversion. It names the output after the input,
/// so only the directory is passed; that matches `with_extension("pdf")`.
#[cfg(not(windows))]
fn converter_command(pptx: &Path, pdf: &Path) -> Result<Command, ExportError> {
    let soffice = which::which("soffice")
        .or_else(|_| which::which("libreoffice"))
        .map_err(|_| ExportError::Unavailable)?;

    let outdir = pdf.parent().unwrap_or_else(|| Path::new("."));
    let mut command = Command::new(soffice);
    command
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(outdir)
        .arg(pptx)
        .kill_on_drop(true);
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_export_missing_document_fails_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pptx = dir.path().join("presentation_2025-01-01_00-00-00.pptx");

        let err = export_to_pdf(&pptx).await.expect_err("must fail");
        assert!(matches!(err, ExportError::MissingDocument(_)));
        assert!(!dir.path().join("presentation_2025-01-01_00-00-00.pdf").exists());
    }
}
