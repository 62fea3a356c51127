//! PTO views of a solved control problem.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wo_dynamics::{TimeSeries, Wec};
use wo_hydro::{Waves, fourier};
use wo_solver::{FrequencySignals, SolveResults, TimeSignals};

use crate::error::PtoResult;
use crate::pto::{PowerKind, Pto};

/// Scalar figures of merit; negative power is absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PtoSummary {
    pub average_mechanical_power_w: f64,
    pub average_electrical_power_w: f64,
    /// Largest absolute PTO force on the post-processing grid.
    pub peak_force_n: f64,
    /// Electrical energy over one repeat period.
    pub energy_j: f64,
}

#[derive(Clone, Debug)]
pub struct PtoReport {
    pub frequency: FrequencySignals,
    pub time: TimeSignals,
    pub summary: PtoSummary,
}

impl Pto {
    /// Position, velocity, acceleration, force and power of every PTO DOF,
    /// plus current and voltage when an impedance model is attached.
    ///
    /// Power in the frequency view is the truncated projection of the
    /// instantaneous power onto the grid harmonics.
    pub fn post_process(
        &self,
        wec: &Wec,
        results: &SolveResults,
        waves: &Waves,
        nsubsteps: usize,
    ) -> PtoResult<PtoReport> {
        let x_wec: &[f64] = &results.x_wec;
        let x_opt: &[f64] = &results.x_opt;
        let grid = wec.grid();
        let args = wec.args(x_wec, x_opt, waves, nsubsteps);

        let mut fd = FrequencySignals {
            frequency_hz: std::iter::once(0.0).chain(grid.frequencies()).collect(),
            channel_names: self.names().to_vec(),
            ..Default::default()
        };
        let mut td = TimeSignals {
            time_s: grid.time(nsubsteps),
            channel_names: self.names().to_vec(),
            ..Default::default()
        };

        fd.insert_coefficients("position", "m", &self.position_coefficients(&args)?);
        fd.insert_coefficients("velocity", "m/s", &self.velocity_coefficients(&args)?);
        fd.insert_coefficients("acceleration", "m/s^2", &self.acceleration_coefficients(&args)?);
        fd.insert_coefficients("force", "N", &self.force_coefficients(&args)?);
        td.insert("position", "m", self.position(&args)?);
        td.insert("velocity", "m/s", self.velocity(&args)?);
        td.insert("acceleration", "m/s^2", self.acceleration(&args)?);
        let force = self.force(&args)?;
        let peak_force_n = td_peak(&force);
        td.insert("force", "N", force);

        let analysis = &wec.ops(nsubsteps).analysis;
        let project = |series: &TimeSeries<f64>| -> Vec<Vec<f64>> {
            series.iter().map(|s| fourier::apply(analysis, s)).collect()
        };

        let mechanical = self.mechanical_power(&args)?;
        fd.insert_coefficients("mechanical_power", "W", &project(&mechanical));
        td.insert("mechanical_power", "W", mechanical);

        if self.impedance().is_some() {
            let (current, voltage) = self.electrical_coefficients(&args)?;
            fd.insert_coefficients("current", "A", &current);
            fd.insert_coefficients("voltage", "V", &voltage);
            td.insert("current", "A", self.current(&args)?);
            td.insert("voltage", "V", self.voltage(&args)?);
        }
        let electrical = self.electrical_power(&args)?;
        fd.insert_coefficients("electrical_power", "W", &project(&electrical));
        td.insert("electrical_power", "W", electrical);

        let summary = PtoSummary {
            average_mechanical_power_w: self.average_power(&args, PowerKind::Mechanical)?,
            average_electrical_power_w: self.average_power(&args, PowerKind::Electrical)?,
            peak_force_n,
            energy_j: self.energy(&args, PowerKind::Electrical)?,
        };

        debug!(
            mechanical_w = summary.average_mechanical_power_w,
            electrical_w = summary.average_electrical_power_w,
            peak_force_n = summary.peak_force_n,
            "PTO post-processing"
        );
        Ok(PtoReport {
            frequency: fd,
            time: td,
            summary,
        })
    }
}

fn td_peak(series: &TimeSeries<f64>) -> f64 {
    series
        .iter()
        .flatten()
        .fold(0.0, |acc: f64, v| acc.max(v.abs()))
}
