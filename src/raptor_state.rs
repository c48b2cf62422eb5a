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

use std::fmt::Write;
use std::rc::Rc;

use crate::time::{hhmmss, Time, UNREACHED};

/// Arrival times and back-pointers for one round of a search.
///
/// The arrays are kept flat and parallel rather than as an array of
/// records: `best_times` and `best_non_transfer_times` are scanned and
/// merged element-wise in the hot loops, the back-pointers only read during
/// path reconstruction.
///
/// Invariants at the end of every round:
/// - `best_times[stop] <= best_non_transfer_times[stop]`,
/// - both families are monotone from one round to the next,
/// - a finite `best_non_transfer_times[stop]` has its two back-pointers set.
pub struct RaptorState {
    /// Best known arrival at each stop, by vehicle or by transfer.
    pub(crate) best_times: Vec<Time>,

    /// Best arrival reached by alighting from a vehicle, never via a
    /// transfer. Propagation and onward boarding read this family.
    pub(crate) best_non_transfer_times: Vec<Time>,

    /// Pattern of the transit leg that last improved
    /// `best_non_transfer_times` at each stop.
    pub(crate) previous_patterns: Vec<Option<usize>>,

    /// Boarding stop of that same transit leg.
    pub(crate) previous_stop: Vec<Option<usize>>,

    /// When the current `best_times` entry was reached by a transfer, the
    /// stop transferred from.
    pub(crate) transfer_stop: Vec<Option<usize>>,

    /// Origin departure time of the search this state belongs to.
    pub(crate) departure_time: Time,

    /// The preceding round, for path reconstruction.
    pub(crate) previous: Option<Rc<RaptorState>>,
}

impl RaptorState {
    pub fn new(nb_of_stops: usize) -> Self {
        Self {
            best_times: vec![UNREACHED; nb_of_stops],
            best_non_transfer_times: vec![UNREACHED; nb_of_stops],
            previous_patterns: vec![None; nb_of_stops],
            previous_stop: vec![None; nb_of_stops],
            transfer_stop: vec![None; nb_of_stops],
            departure_time: 0,
            previous: None,
        }
    }

    /// Clones the arrays; the `previous` chain is shared, not cloned.
    pub fn copy(&self) -> Self {
        Self {
            best_times: self.best_times.clone(),
            best_non_transfer_times: self.best_non_transfer_times.clone(),
            previous_patterns: self.previous_patterns.clone(),
            previous_stop: self.previous_stop.clone(),
            transfer_stop: self.transfer_stop.clone(),
            departure_time: self.departure_time,
            previous: self.previous.clone(),
        }
    }

    /// Clones the arrays and the whole `previous` chain. Used when a caller
    /// archives per-iteration states that must outlive the search.
    pub fn deep_copy(&self) -> Self {
        let mut copy = self.copy();
        copy.previous = self
            .previous
            .as_ref()
            .map(|previous| Rc::new(previous.deep_copy()));
        copy
    }

    /// Element-wise merge of `other` into `self`, the two arrival families
    /// updated independently. An improvement of `best_times` brings the
    /// transfer provenance with it; an improvement of
    /// `best_non_transfer_times` brings the vehicle back-pointers. Neither
    /// family ever overwrites the other's provenance.
    pub fn min(&mut self, other: &RaptorState) {
        debug_assert_eq!(self.best_times.len(), other.best_times.len());
        for stop in 0..self.best_times.len() {
            if other.best_times[stop] < self.best_times[stop] {
                self.best_times[stop] = other.best_times[stop];
                self.transfer_stop[stop] = other.transfer_stop[stop];
            }
            if other.best_non_transfer_times[stop] < self.best_non_transfer_times[stop] {
                self.best_non_transfer_times[stop] = other.best_non_transfer_times[stop];
                self.previous_patterns[stop] = other.previous_patterns[stop];
                self.previous_stop[stop] = other.previous_stop[stop];
            }
        }
    }

    pub fn nb_of_stops(&self) -> usize {
        self.best_times.len()
    }

    pub fn best_time(&self, stop: usize) -> Time {
        self.best_times[stop]
    }

    pub fn best_non_transfer_time(&self, stop: usize) -> Time {
        self.best_non_transfer_times[stop]
    }

    pub fn best_non_transfer_times(&self) -> &[Time] {
        &self.best_non_transfer_times
    }

    /// Pattern of the transit leg behind `best_non_transfer_times[stop]`.
    pub fn board_pattern(&self, stop: usize) -> Option<usize> {
        self.previous_patterns[stop]
    }

    /// Boarding stop of the transit leg behind
    /// `best_non_transfer_times[stop]`.
    pub fn board_stop(&self, stop: usize) -> Option<usize> {
        self.previous_stop[stop]
    }

    /// The stop transferred from, when `best_times[stop]` was reached by a
    /// transfer.
    pub fn transfer_origin(&self, stop: usize) -> Option<usize> {
        self.transfer_stop[stop]
    }

    pub fn departure_time(&self) -> Time {
        self.departure_time
    }

    /// Renders the back-pointer chain ending at `stop`, walking the
    /// `previous` rounds as far as they are linked. Diagnostics only.
    pub fn dump(&self, stop: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "path to stop {}, departure at {} :",
            stop,
            hhmmss(self.departure_time)
        );
        let mut state = Some(self);
        let mut current = stop;
        while let Some(round) = state {
            if let Some(origin) = round.transfer_stop[current] {
                let _ = writeln!(
                    out,
                    "  stop {} at {} : transfer from stop {}",
                    current,
                    hhmmss(round.best_times[current]),
                    origin
                );
                current = origin;
            }
            match (
                round.previous_patterns[current],
                round.previous_stop[current],
            ) {
                (Some(pattern), Some(board_stop)) => {
                    let _ = writeln!(
                        out,
                        "  stop {} at {} : pattern {} boarded at stop {}",
                        current,
                        hhmmss(round.best_non_transfer_times[current]),
                        pattern,
                        board_stop
                    );
                    current = board_stop;
                    state = round.previous.as_deref();
                }
                _ => {
                    let _ = writeln!(
                        out,
                        "  stop {} at {} : access",
                        current,
                        hhmmss(round.best_times[current])
                    );
                    break;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_unreached_everywhere() {
        let state = RaptorState::new(3);
        assert!(state.best_times.iter().all(|&t| t == UNREACHED));
        assert!(state.best_non_transfer_times.iter().all(|&t| t == UNREACHED));
        assert!(state.transfer_stop.iter().all(|t| t.is_none()));
    }

    #[test]
    fn copy_then_min_with_source_is_identity() {
        let mut state = RaptorState::new(2);
        state.best_times = vec![100, UNREACHED];
        state.best_non_transfer_times = vec![120, UNREACHED];
        state.previous_patterns = vec![Some(4), None];
        state.previous_stop = vec![Some(1), None];
        state.transfer_stop = vec![None, Some(0)];

        let mut copy = state.copy();
        copy.min(&state);

        assert_eq!(copy.best_times, state.best_times);
        assert_eq!(copy.best_non_transfer_times, state.best_non_transfer_times);
        assert_eq!(copy.previous_patterns, state.previous_patterns);
        assert_eq!(copy.previous_stop, state.previous_stop);
        assert_eq!(copy.transfer_stop, state.transfer_stop);
    }

    #[test]
    fn min_updates_the_two_families_independently() {
        let mut target = RaptorState::new(1);
        target.best_times = vec![200];
        target.best_non_transfer_times = vec![250];
        target.transfer_stop = vec![Some(7)];
        target.previous_patterns = vec![Some(1)];
        target.previous_stop = vec![Some(2)];

        // better transfer time, worse vehicle time
        let mut other = RaptorState::new(1);
        other.best_times = vec![150];
        other.best_non_transfer_times = vec![300];
        other.transfer_stop = vec![None];
        other.previous_patterns = vec![Some(9)];
        other.previous_stop = vec![Some(9)];

        target.min(&other);

        assert_eq!(target.best_times, vec![150]);
        assert_eq!(target.transfer_stop, vec![None]);
        // vehicle family untouched
        assert_eq!(target.best_non_transfer_times, vec![250]);
        assert_eq!(target.previous_patterns, vec![Some(1)]);
        assert_eq!(target.previous_stop, vec![Some(2)]);
    }

    #[test]
    fn deep_copy_detaches_the_previous_chain() {
        let mut first = RaptorState::new(1);
        first.best_times = vec![100];
        let mut second = RaptorState::new(1);
        second.previous = Some(Rc::new(first));

        let detached = second.deep_copy();
        let original_tail = second.previous.as_ref().unwrap();
        let detached_tail = detached.previous.as_ref().unwrap();
        assert!(!Rc::ptr_eq(original_tail, detached_tail));
        assert_eq!(detached_tail.best_times, vec![100]);
    }
}
