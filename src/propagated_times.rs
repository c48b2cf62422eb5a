// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use fixedbitset::FixedBitSet;

use crate::time::{Time, UNREACHED};

/// How the per-target summary bounds are derived. The bounding iterations
/// run per departure minute make `MinMax` valid even for sampled frequency
/// networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceCalculationMethod {
    MinMax,
}

/// Per-target summary of the iteration matrix: minimum, average and maximum
/// elapsed travel time. Percentile computation is the caller's business.
pub struct PropagatedTimesStore {
    mins: Vec<Time>,
    avgs: Vec<Time>,
    maxs: Vec<Time>,
}

impl PropagatedTimesStore {
    pub fn new(nb_of_targets: usize) -> Self {
        Self {
            mins: vec![UNREACHED; nb_of_targets],
            avgs: vec![UNREACHED; nb_of_targets],
            maxs: vec![UNREACHED; nb_of_targets],
        }
    }

    /// Summarizes `times[iteration][target]`. Only the iterations marked in
    /// `include_in_averages` contribute to the average; a target unreached
    /// in any averaged iteration has an `UNREACHED` average. The min and
    /// max scan every iteration.
    pub fn set_from_array(
        &mut self,
        times: &[Vec<Time>],
        include_in_averages: &FixedBitSet,
        _method: ConfidenceCalculationMethod,
    ) {
        for target in 0..self.mins.len() {
            let mut min = UNREACHED;
            let mut max = 0;
            let mut any_unreached = false;
            let mut sum: i64 = 0;
            let mut averaged = 0;
            let mut averaged_unreached = false;

            for (iteration, row) in times.iter().enumerate() {
                let time = row[target];
                if time == UNREACHED {
                    any_unreached = true;
                } else {
                    min = min.min(time);
                    max = max.max(time);
                }
                if include_in_averages.contains(iteration) {
                    averaged += 1;
                    if time == UNREACHED {
                        averaged_unreached = true;
                    } else {
                        sum += i64::from(time);
                    }
                }
            }

            self.mins[target] = min;
            self.maxs[target] = if any_unreached || times.is_empty() {
                UNREACHED
            } else {
                max
            };
            self.avgs[target] = if averaged == 0 || averaged_unreached {
                UNREACHED
            } else {
                (sum / averaged) as Time
            };
        }
    }

    pub fn min_times(&self) -> &[Time] {
        &self.mins
    }

    pub fn avg_times(&self) -> &[Time] {
        &self.avgs
    }

    pub fn max_times(&self) -> &[Time] {
        &self.maxs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_reached_targets_and_masks_bounding_draws() {
        let times = vec![vec![100], vec![300], vec![200]];
        // first two rows are bounding draws, only the last is averaged
        let mut include = FixedBitSet::with_capacity(3);
        include.set(2, true);

        let mut store = PropagatedTimesStore::new(1);
        store.set_from_array(&times, &include, ConfidenceCalculationMethod::MinMax);

        assert_eq!(store.min_times(), &[100]);
        assert_eq!(store.max_times(), &[300]);
        assert_eq!(store.avg_times(), &[200]);
    }

    #[test]
    fn unreached_iterations_poison_max_and_average() {
        let times = vec![vec![100], vec![UNREACHED]];
        let mut include = FixedBitSet::with_capacity(2);
        include.set(0, true);
        include.set(1, true);

        let mut store = PropagatedTimesStore::new(1);
        store.set_from_array(&times, &include, ConfidenceCalculationMethod::MinMax);

        assert_eq!(store.min_times(), &[100]);
        assert_eq!(store.max_times(), &[UNREACHED]);
        assert_eq!(store.avg_times(), &[UNREACHED]);
    }
}
