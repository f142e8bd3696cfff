use nalgebra::{ComplexField, Matrix2};
use serde::Serialize;
use std::{fs::File, io, path::Path};

use crate::if64;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error(r#"found data file extension: "{0}", expected "pkl""#)]
    DataFileExtension(String),
    #[error(r#"missing data file extension: "pkl""#)]
    MissingFileExtension,
    #[error("failed to create data file: {0}")]
    CreateDataFile(#[from] io::Error),
    #[error("failed to serialize data to pickle file")]
    SerPkl(#[from] serde_pickle::Error),
}

type Result<T> = std::result::Result<T, DataError>;

pub trait Cartesian2Polar {
    type Output: std::fmt::Debug + Serialize;
    fn magnitude(&self) -> Self::Output;
    fn phase(&self) -> Self::Output;
}

impl Cartesian2Polar for Matrix2<if64> {
    type Output = Matrix2<f64>;

    fn magnitude(&self) -> Self::Output {
        self.map(|x| x.modulus())
    }

    fn phase(&self) -> Self::Output {
        self.map(|x| x.argument())
    }
}

impl Cartesian2Polar for if64 {
    type Output = f64;

    fn magnitude(&self) -> Self::Output {
        self.modulus()
    }

    fn phase(&self) -> Self::Output {
        self.argument()
    }
}

#[derive(Debug, Serialize)]
pub struct FrequencyResponseData<T: Cartesian2Polar> {
    /// angular frequency [rad/s]
    pub frequency: f64,
    pub magnitude: <T as Cartesian2Polar>::Output,
    pub phase: <T as Cartesian2Polar>::Output,
}
impl<T: Cartesian2Polar> FrequencyResponseData<T> {
    pub fn new(frequency: f64, response: T) -> Self {
        Self {
            frequency,
            magnitude: response.magnitude(),
            phase: response.phase(),
        }
    }
}

/// Writes analysis results to a Python pickle file
pub trait Dump: Serialize + Sized {
    fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        match path.as_ref().extension() {
            Some(ext) if ext == "pkl" => {
                let mut file = File::create(&path)?;
                serde_pickle::to_writer(&mut file, self, Default::default())?;
                log::info!("data written to {:?}", path.as_ref());
                Ok(())
            }
            Some(ext) => Err(DataError::DataFileExtension(
                ext.to_string_lossy().into_owned(),
            )),
            None => Err(DataError::MissingFileExtension),
        }
    }
}
impl<T: Serialize> Dump for T {}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn polar() {
        let z = if64::new(0., 2.);
        assert_relative_eq!(z.magnitude(), 2.);
        assert_relative_eq!(z.phase(), FRAC_PI_2);
        let data = FrequencyResponseData::new(1., Matrix2::from_element(z));
        assert_relative_eq!(data.magnitude[(1, 0)], 2.);
    }

    #[test]
    fn dump_pickle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.pkl");
        vec![1f64, 2., 3.].dump(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn dump_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            vec![1f64].dump(dir.path().join("data.mat")),
            Err(DataError::DataFileExtension(ext)) if ext == "mat"
        ));
        assert!(matches!(
            vec![1f64].dump(dir.path().join("data")),
            Err(DataError::MissingFileExtension)
        ));
    }
}
