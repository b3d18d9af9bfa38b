//! Capture → SignalRecord

use crate::container::{CaptureContainer, CaptureFile, ContainerFormat};
use crate::record::{Samples, SignalRecord};
use crate::LoadError;
use rustfft::num_complex::Complex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Raw sample array (2-D, first row used)
pub const SAMPLES_PATH: &str = "IntraPulse/DATA";
/// Optional quadrature component, same layout as [`SAMPLES_PATH`]
pub const QUADRATURE_PATH: &str = "IntraPulse/DATA_Q";
/// Integer emitter label code
pub const LABEL_PATH: &str = "InterPulse/LABEL";
/// Integer sample rate code, in megahertz
pub const SAMPLE_RATE_PATH: &str = "TAG/SampleRate";

/// Sample rate codes are stored in MHz. This is a fixed property of the
/// capture format, not something inferred per file. A format revision that
/// stores hertz directly needs its own versioned branch here.
pub const SAMPLE_RATE_SCALE_HZ: f64 = 1_000_000.0;

/// Load a capture from disk and build its [`SignalRecord`].
pub fn load_signal_record(path: impl AsRef<Path>) -> Result<SignalRecord, LoadError> {
    let path = path.as_ref();
    let capture = CaptureFile::read(path)?;
    let format = ContainerFormat::from_path(path);

    let mut provenance = BTreeMap::new();
    provenance.insert("file_path".to_string(), path.display().to_string());
    provenance.insert("container_format".to_string(), format.as_str().to_string());

    let record = record_from_container(&capture, provenance)?;
    info!(
        "Loaded {}: {} samples at {:.3} MHz, label={:?}",
        path.display(),
        record.len(),
        record.sample_rate_hz() / SAMPLE_RATE_SCALE_HZ,
        record.label()
    );
    Ok(record)
}

/// Build a record from any decoded container. `provenance` entries are
/// copied into the record metadata.
pub fn record_from_container<C: CaptureContainer>(
    container: &C,
    provenance: BTreeMap<String, String>,
) -> Result<SignalRecord, LoadError> {
    // All required paths must exist before anything is read
    for path in [SAMPLES_PATH, LABEL_PATH, SAMPLE_RATE_PATH] {
        if container.dataset(path).is_none() {
            return Err(LoadError::MissingPath(path));
        }
    }

    let in_phase = required(container, SAMPLES_PATH)?
        .first_row()
        .ok_or_else(|| invalid(SAMPLES_PATH, "expected a consistent 2-D array"))?;

    let label_code = required(container, LABEL_PATH)?
        .first_int()
        .ok_or_else(|| invalid(LABEL_PATH, "expected an integer entry"))?;

    let rate_code = required(container, SAMPLE_RATE_PATH)?
        .first_int()
        .ok_or_else(|| invalid(SAMPLE_RATE_PATH, "expected an integer entry"))?;
    if rate_code <= 0 {
        return Err(LoadError::InvalidSampleRate(format!(
            "rate code {} is not positive",
            rate_code
        )));
    }
    let sample_rate_hz = rate_code as f64 * SAMPLE_RATE_SCALE_HZ;

    let samples = match container.dataset(QUADRATURE_PATH) {
        Some(dataset) => {
            let quadrature = dataset
                .first_row()
                .ok_or_else(|| invalid(QUADRATURE_PATH, "expected a consistent 2-D array"))?;
            if quadrature.len() != in_phase.len() {
                return Err(invalid(
                    QUADRATURE_PATH,
                    &format!(
                        "row length {} differs from in-phase length {}",
                        quadrature.len(),
                        in_phase.len()
                    ),
                ));
            }
            Samples::Complex(
                in_phase
                    .iter()
                    .zip(&quadrature)
                    .map(|(&i, &q)| Complex::new(i, q))
                    .collect(),
            )
        }
        None => Samples::Real(in_phase),
    };

    let mut metadata = provenance;
    metadata.insert("original_label".to_string(), label_code.to_string());
    metadata.insert("raw_sample_rate_code".to_string(), rate_code.to_string());
    metadata.insert("sample_rate_unit".to_string(), "MHz".to_string());
    metadata.insert("is_complex".to_string(), samples.is_complex().to_string());

    debug!(
        "Decoded capture: {} samples, label code {}, rate code {}",
        samples.len(),
        label_code,
        rate_code
    );

    SignalRecord::new(samples, sample_rate_hz, Some(label_code.to_string()), metadata)
}

fn required<'a, C: CaptureContainer>(
    container: &'a C,
    path: &'static str,
) -> Result<&'a crate::Dataset, LoadError> {
    container.dataset(path).ok_or(LoadError::MissingPath(path))
}

fn invalid(path: &'static str, reason: &str) -> LoadError {
    LoadError::InvalidDataset {
        path,
        reason: reason.to_string(),
    }
}
