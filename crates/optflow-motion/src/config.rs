use serde::{Deserialize, Serialize};

use crate::{
    error::FlowError,
    extractor::MotionExtractor,
    horn_schunck::{HornSchunck, HornSchunckParams},
    lucas_kanade::{LucasKanade, LucasKanadeParams},
    proesmans::{Proesmans, ProesmansParams},
    pyramidal::{PyramidParams, PyramidalExtractor},
};

/// The algorithm of an extractor together with its parameters.
///
/// Serialized with an `"algorithm"` tag next to the parameters, e.g.
/// `{"algorithm": "proesmans", "lambda": 50.0}`. Parameters that are left out
/// take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum AlgorithmConfig {
    /// Horn-Schunck global smoothness solver.
    HornSchunck(HornSchunckParams),
    /// Lucas-Kanade local least squares solver.
    LucasKanade(LucasKanadeParams),
    /// Proesmans bidirectional non-linear diffusion solver.
    Proesmans(ProesmansParams),
}

impl AlgorithmConfig {
    /// Default parameters for an algorithm given by its tag name.
    ///
    /// # Example
    ///
    /// ```
    /// use optflow_motion::AlgorithmConfig;
    ///
    /// assert!(AlgorithmConfig::from_name("lucas-kanade").is_ok());
    /// assert!(AlgorithmConfig::from_name("farneback").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self, FlowError> {
        match name {
            "horn-schunck" => Ok(AlgorithmConfig::HornSchunck(Default::default())),
            "lucas-kanade" => Ok(AlgorithmConfig::LucasKanade(Default::default())),
            "proesmans" => Ok(AlgorithmConfig::Proesmans(Default::default())),
            _ => Err(FlowError::invalid(
                "algorithm",
                format!("unknown algorithm `{name}`, expected horn-schunck, lucas-kanade or proesmans"),
            )),
        }
    }

    /// The tag name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmConfig::HornSchunck(_) => "horn-schunck",
            AlgorithmConfig::LucasKanade(_) => "lucas-kanade",
            AlgorithmConfig::Proesmans(_) => "proesmans",
        }
    }

    /// Override the number of iterations of the algorithm.
    pub fn set_num_iterations(&mut self, num_iterations: usize) {
        match self {
            AlgorithmConfig::HornSchunck(p) => p.num_iterations = num_iterations,
            AlgorithmConfig::LucasKanade(p) => p.num_iterations = num_iterations,
            AlgorithmConfig::Proesmans(p) => p.num_iterations = num_iterations,
        }
    }

    /// Build the single resolution extractor, validating the parameters.
    pub fn build(&self) -> Result<MotionExtractor, FlowError> {
        Ok(match self {
            AlgorithmConfig::HornSchunck(p) => HornSchunck::new(p.clone())?.into(),
            AlgorithmConfig::LucasKanade(p) => LucasKanade::new(p.clone())?.into(),
            AlgorithmConfig::Proesmans(p) => Proesmans::new(p.clone())?.into(),
        })
    }
}

/// Complete configuration of a pyramidal extractor.
///
/// ```
/// use optflow_motion::{AlgorithmConfig, ExtractorConfig};
///
/// let json = r#"{ "algorithm": "horn-schunck", "alpha": 0.5, "pyramid": { "num_levels": 2 } }"#;
/// let config: ExtractorConfig = serde_json::from_str(json)?;
///
/// match &config.algorithm {
///     AlgorithmConfig::HornSchunck(p) => {
///         assert_eq!(p.alpha, 0.5);
///         assert_eq!(p.num_iterations, 500);
///     }
///     _ => unreachable!(),
/// }
/// assert_eq!(config.pyramid.num_levels, 2);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// The algorithm and its parameters.
    #[serde(flatten)]
    pub algorithm: AlgorithmConfig,
    /// The pyramid parameters.
    #[serde(default)]
    pub pyramid: PyramidParams,
}

impl ExtractorConfig {
    /// Default configuration for an algorithm given by its tag name.
    pub fn from_name(name: &str) -> Result<Self, FlowError> {
        Ok(Self {
            algorithm: AlgorithmConfig::from_name(name)?,
            pyramid: PyramidParams::default(),
        })
    }

    /// Build the pyramidal extractor, validating all parameters.
    pub fn build(&self) -> Result<PyramidalExtractor<MotionExtractor>, FlowError> {
        PyramidalExtractor::new(self.algorithm.build()?, self.pyramid.clone())
    }
}
