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

use std::cmp::{max, min};
use std::mem;

use tracing::error;

use crate::engine::{intersects, RangeRaptor};
use crate::raptor_state::RaptorState;
use crate::request::BoardingAssumption;
use crate::time::UNREACHED;

impl<'data> RangeRaptor<'data> {
    /// One RAPTOR round: scan every marked pattern, relax arrivals into
    /// `output`, then run the transfers pass which rebuilds the marked set
    /// for the next round.
    ///
    /// With `frequencies` set, each pattern first attempts a frequency
    /// boarding under the given assumption. A pattern boarded as frequency
    /// is not also ridden on its timetable in the same round; scheduled
    /// patterns on the other hand are always scanned, even during a
    /// frequency search, since frequency legs can feed scheduled ones and
    /// back, any number of times.
    ///
    /// Returns true if any stop was improved.
    pub(crate) fn do_one_round(
        &mut self,
        input: &RaptorState,
        output: &mut RaptorState,
        frequencies: Option<BoardingAssumption>,
    ) -> bool {
        let data = self.data;
        self.stops_touched_this_round.clear();

        // the marked set is moved out for the duration of the scan, the
        // transfers pass rebuilds it afterwards
        let patterns_touched = mem::take(&mut self.patterns_touched_this_round);
        'patterns: for pattern_index in patterns_touched.ones() {
            let pattern = data.pattern(pattern_index);

            // patterns without a trip running today are not worth scanning,
            // this gate alone can double search speed
            if !intersects(&pattern.services, &self.services_active) {
                continue;
            }

            if let Some(assumption) = frequencies {
                // Frequency sub-pass. Sweep the stops in order, keeping the
                // best boarding found so far; `remain_on_board` is the
                // arrival at the current stop when staying on that vehicle.
                let mut best_board_time = UNREACHED;
                let mut best_board_position = usize::MAX;
                let mut best_board_stop = usize::MAX;
                let mut best_trip: Option<usize> = None;

                for (position, &stop) in pattern.stops.iter().enumerate() {
                    let remain_on_board = match best_trip {
                        Some(trip_index) => {
                            let trip = &pattern.trips[trip_index];
                            best_board_time
                                + (trip.arrivals[position] - trip.departures[best_board_position])
                        }
                        None => UNREACHED,
                    };

                    if input.best_times[stop] != UNREACHED {
                        let slack_time = input.best_times[stop] + self.board_slack;
                        for (trip_index, trip) in pattern.trips.iter().enumerate() {
                            let entries = match &trip.frequency {
                                Some(entries) => entries,
                                None => continue,
                            };
                            if !self.services_active.contains(trip.service) {
                                continue;
                            }

                            // Best board time over the entries of this trip.
                            // Entries are treated as uncorrelated draws; when
                            // they overlap or touch this is an approximation.
                            let mut board_time = UNREACHED;
                            'entries: for entry in 0..entries.len() {
                                let departure = trip.departures[position];
                                let board_this_entry = match assumption {
                                    BoardingAssumption::BestCase => {
                                        if slack_time > entries.end_times[entry] + departure {
                                            continue 'entries;
                                        }
                                        max(slack_time, entries.start_times[entry] + departure)
                                    }
                                    BoardingAssumption::WorstCase => {
                                        // a full headway is waited, and the
                                        // entry must have a full headway left
                                        if slack_time
                                            > entries.end_times[entry] + departure
                                                - entries.headway_seconds[entry]
                                        {
                                            continue 'entries;
                                        }
                                        max(
                                            slack_time + entries.headway_seconds[entry],
                                            entries.start_times[entry]
                                                + departure
                                                + entries.headway_seconds[entry],
                                        )
                                    }
                                    BoardingAssumption::Random => {
                                        let offset =
                                            self.offsets.offset(pattern_index, trip_index, entry);
                                        let mut time =
                                            entries.start_times[entry] + departure + offset;
                                        while time < slack_time {
                                            time += entries.headway_seconds[entry];
                                            // the implied terminal departure ran
                                            // past the end of the entry : no
                                            // vehicle left to catch
                                            if time - departure > entries.end_times[entry] {
                                                continue 'entries;
                                            }
                                        }
                                        time
                                    }
                                };
                                board_time = min(board_time, board_this_entry);
                            }

                            if board_time != UNREACHED && board_time < remain_on_board {
                                // several trips can be boardable at the same
                                // position, keep the earliest boarding
                                if best_board_position == position && best_board_time < board_time
                                {
                                    continue;
                                }
                                best_board_time = board_time;
                                best_board_position = position;
                                best_board_stop = stop;
                                best_trip = Some(trip_index);
                            }
                        }
                    }

                    // A fresh boarding at this stop never relaxes it : its
                    // remain-on-board arrival is necessarily later than the
                    // time that allowed the boarding.
                    if remain_on_board != UNREACHED
                        && remain_on_board < self.max_time
                        && output.best_non_transfer_times[stop] > remain_on_board
                    {
                        output.best_non_transfer_times[stop] = remain_on_board;
                        output.previous_patterns[stop] = Some(pattern_index);
                        output.previous_stop[stop] = Some(best_board_stop);
                        self.stops_touched_this_round.set(stop, true);
                        self.stops_touched_this_search.set(stop, true);

                        if output.best_times[stop] > remain_on_board {
                            output.best_times[stop] = remain_on_board;
                            // not reached via a transfer anymore
                            output.transfer_stop[stop] = None;
                        }

                        if output.best_non_transfer_times[stop]
                            > input.best_non_transfer_times[stop]
                            || output.best_times[stop] > input.best_times[stop]
                        {
                            error!("relaxing increased the travel time at stop {}", stop);
                            debug_assert!(false, "relaxing increased the travel time at stop {}", stop);
                        }
                        if remain_on_board < output.departure_time {
                            error!(
                                "arrival before departure, path dump follows :\n{}",
                                output.dump(stop)
                            );
                            debug_assert!(false, "arrival before departure at stop {}", stop);
                        }
                    }
                }

                // frequencies and timetables are not mixed on one pattern
                // within a round
                if best_trip.is_some() {
                    continue 'patterns;
                }
            }

            // Scheduled sub-pass: linear scan with a single on-board trip.
            let mut on_trip: Option<usize> = None;
            let mut board_stop = usize::MAX;
            for (position, &stop) in pattern.stops.iter().enumerate() {
                match on_trip {
                    None => {
                        if input.best_times[stop] == UNREACHED {
                            continue;
                        }
                        for (trip_index, trip) in pattern.trips.iter().enumerate() {
                            if trip.frequency.is_some()
                                || !self.services_active.contains(trip.service)
                            {
                                continue;
                            }
                            if trip.departures[position]
                                > input.best_times[stop] + self.board_slack
                            {
                                // trips are sorted : the first usable one is
                                // the earliest
                                on_trip = Some(trip_index);
                                board_stop = stop;
                                break;
                            }
                        }
                    }
                    Some(trip_index) => {
                        let arrival_time = pattern.trips[trip_index].arrivals[position];
                        if arrival_time > self.max_time {
                            // nothing downstream can be in time either
                            continue 'patterns;
                        }

                        if arrival_time < output.best_non_transfer_times[stop] {
                            output.best_non_transfer_times[stop] = arrival_time;
                            output.previous_patterns[stop] = Some(pattern_index);
                            output.previous_stop[stop] = Some(board_stop);
                            self.stops_touched_this_round.set(stop, true);
                            self.stops_touched_this_search.set(stop, true);

                            if arrival_time < output.best_times[stop] {
                                output.best_times[stop] = arrival_time;
                                output.transfer_stop[stop] = None;
                            }
                        }

                        // This stop was reached faster than the current trip
                        // arrives : an earlier trip may be catchable. Walk
                        // back towards the first trip, switching as long as
                        // the departure still leaves room to board.
                        if input.best_times[stop] < arrival_time {
                            let mut candidate = trip_index;
                            while candidate > 0 {
                                candidate -= 1;
                                let trip = &pattern.trips[candidate];
                                if trip.frequency.is_some()
                                    || !self.services_active.contains(trip.service)
                                {
                                    continue;
                                }
                                if trip.departures[position]
                                    > input.best_times[stop] + self.board_slack
                                {
                                    on_trip = Some(candidate);
                                    board_stop = stop;
                                } else {
                                    // trips are sorted, nothing earlier can
                                    // be caught
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }
        self.patterns_touched_this_round = patterns_touched;

        // the transfers pass marks the patterns of the next round; any
        // marked pattern means some stop was improved
        self.do_transfers(output)
    }

    /// Transfer out of every stop improved this round, then mark the
    /// patterns of the next round. There is no separate transfers round:
    /// a round is one ride followed by its transfers.
    ///
    /// Transfers only ever improve `best_times`; `best_non_transfer_times`
    /// stays a pure vehicle-arrival family.
    pub(crate) fn do_transfers(&mut self, state: &mut RaptorState) -> bool {
        let data = self.data;
        self.patterns_touched_this_round.clear();

        let stops_touched = mem::take(&mut self.stops_touched_this_round);
        for stop in stops_touched.ones() {
            // staying put is the trivial transfer
            self.mark_patterns_for_stop(stop);

            let from_time = state.best_non_transfer_times[stop];
            for &(to_stop, distance) in &data.stop_data(stop).transfers {
                let to_time = from_time + (f64::from(distance) / self.req.walk_speed) as i32;
                if to_time < self.max_time && to_time < state.best_times[to_stop] {
                    state.best_times[to_stop] = to_time;
                    state.transfer_stop[to_stop] = Some(stop);
                    self.mark_patterns_for_stop(to_stop);
                }
            }
        }
        self.stops_touched_this_round = stops_touched;

        self.patterns_touched_this_round.count_ones(..) != 0
    }
}
