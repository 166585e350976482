//! Interface to the physical flux model of a pulse.
//!
//! The population only decides the parameters of each pulse. Computing
//! spectra, light curves and photon events from them is the job of a
//! [`SourceFunction`] implementation.

use rand::RngCore;

use crate::error::ValidationError;

/// Energy dependent effective area of a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveArea {
    energies: Vec<f64>,
    areas: Vec<f64>,
}

impl EffectiveArea {
    pub fn new(energies: Vec<f64>, areas: Vec<f64>) -> Result<EffectiveArea, ValidationError> {
        if energies.is_empty() || energies.len() != areas.len() {
            return Err(ValidationError::InvalidSource(format!(
                "effective area needs one area per energy, got {} energies and {} areas",
                energies.len(),
                areas.len()
            )));
        }
        if energies.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ValidationError::InvalidSource(
                "effective area energies must be strictly increasing".to_string(),
            ));
        }
        Ok(EffectiveArea { energies, areas })
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn areas(&self) -> &[f64] {
        &self.areas
    }
}

/// Parameters of a cutoff power law whose peak energy decays over time and
/// whose normalization follows the luminosity relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrCplParameters {
    pub peak_flux: f64,
    /// Peak energy at the start of the pulse in keV.
    pub ep_start: f64,
    /// Decay time scale of the peak energy.
    pub ep_tau: f64,
    /// Low energy spectral index.
    pub alpha: f64,
    pub emin: f64,
    pub emax: f64,
    /// Normalization of the luminosity relation, `Nrest`.
    pub n_rest: f64,
    /// Slope of the luminosity relation.
    pub gamma: f64,
    pub redshift: f64,
}

impl Default for CorrCplParameters {
    fn default() -> Self {
        Self {
            peak_flux: 1e-6,
            ep_start: 300.,
            ep_tau: 1.,
            alpha: -1.,
            emin: 10.,
            emax: 1e4,
            n_rest: 1e52,
            gamma: 1.5,
            redshift: 1.,
        }
    }
}

impl CorrCplParameters {
    /// Check the parameters before they are handed to a source function.
    ///
    /// Event sampling of this spectrum relies on rejection sampling that
    /// only works well for a negative spectral index, so `alpha` has to be
    /// negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.alpha.is_nan() || self.alpha >= 0. {
            return Err(ValidationError::OutOfBounds {
                parameter: "alpha".to_string(),
                value: self.alpha,
                vmin: None,
                vmax: Some(0.),
            });
        }
        let valid_range = self.emin > 0. && self.emin < self.emax;
        if !valid_range {
            return Err(ValidationError::InvalidSource(format!(
                "energy range [{}, {}] is empty or not positive",
                self.emin, self.emax
            )));
        }
        for (name, value) in [
            ("peak_flux", self.peak_flux),
            ("ep_start", self.ep_start),
            ("ep_tau", self.ep_tau),
        ] {
            if value.is_nan() || value <= 0. {
                return Err(ValidationError::OutOfBounds {
                    parameter: name.to_string(),
                    value,
                    vmin: Some(0.),
                    vmax: None,
                });
            }
        }
        if self.redshift.is_nan() || self.redshift < 0. {
            return Err(ValidationError::OutOfBounds {
                parameter: "redshift".to_string(),
                value: self.redshift,
                vmin: Some(0.),
                vmax: None,
            });
        }
        Ok(())
    }
}

/// Time and energy dependent emission of one source as seen by a detector.
///
/// All methods are pure functions of the source parameters and return
/// arrays aligned with their input grids.
pub trait SourceFunction {
    /// Photon flux density at each `(energy, time)` pair.
    fn evolution(&self, energy: &[f64], time: &[f64]) -> Vec<f64>;

    /// Spectrum integrated over `[tmin, tmax]` at each energy.
    fn time_integrated_spectrum(&self, energy: &[f64], tmin: f64, tmax: f64) -> Vec<f64>;

    /// Flux integrated over the energy range at each time.
    fn energy_integrated_evolution(&self, time: &[f64]) -> Vec<f64>;

    /// Photon arrival times in `[tstart, tstop]`. `fmax` bounds the rate.
    fn sample_events(&self, tstart: f64, tstop: f64, fmax: f64, rng: &mut dyn RngCore) -> Vec<f64>;

    /// One photon energy for each arrival time.
    fn sample_energy(&self, times: &[f64], rng: &mut dyn RngCore) -> Vec<f64>;
}
