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

mod utils;

use anyhow::Error;
use hugin::{
    LinkedPointSet, PointSetTimes, RangeRaptor, TransitData, TransitDataBuilder, UNREACHED,
};
use utils::{assert_state_invariants, init_test_logger, request};

#[test]
fn walk_only_network_reports_the_non_transit_time() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    // one stop, no transit at all : every minute falls back to the
    // street-network baseline
    let data = TransitDataBuilder::new("2020-01-01", "2020-01-02")
        .stop("A")
        .build();
    let targets = LinkedPointSet::new(1, data.nb_of_stops());
    let non_transit = PointSetTimes::new(vec![600]);

    let mut worker = RangeRaptor::new(&data, Some(&targets), request(0, 3600))?;
    let output = worker.solve(&[(0, 300)], &non_transit)?;

    assert_eq!(output.times_at_targets_each_iteration.len(), 60);
    for row in &output.times_at_targets_each_iteration {
        assert_eq!(row.as_slice(), &[600]);
    }
    assert_eq!(output.include_in_averages.count_ones(..), 60);
    assert_eq!(output.store.min_times(), &[600]);
    assert_eq!(output.store.avg_times(), &[600]);
    assert_eq!(output.store.max_times(), &[600]);
    assert_eq!(output.statistics.search_count, 60);
    Ok(())
}

#[test]
fn single_trip_is_caught_until_boarding_becomes_impossible() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let data = TransitDataBuilder::new("2020-01-01", "2020-01-02")
        .service("day", &["2020-01-01"])
        .pattern(&["A", "B"], |pattern| {
            pattern.trip("day", &["00:10:00", "00:15:00"]);
        })
        .build();
    let mut targets = LinkedPointSet::new(1, data.nb_of_stops());
    targets.link(1, 0, 30);

    let mut worker = RangeRaptor::new(&data, Some(&targets), request(0, 1200))?;
    let output = worker.solve(&[(0, 60)], &PointSetTimes::unreached(1))?;

    assert_eq!(output.times_at_targets_each_iteration.len(), 20);
    for (iteration, row) in output.times_at_targets_each_iteration.iter().enumerate() {
        let departure_time = 1140 - 60 * iteration as i32;
        // boarding needs the 00:10:00 departure to be strictly later than
        // arrival at A plus the board slack
        if 600 > departure_time + 60 + 60 {
            assert_eq!(row.as_slice(), &[900 + 30 - departure_time]);
        } else {
            assert_eq!(row.as_slice(), &[UNREACHED]);
        }
    }
    // the last minute able to board departs at 00:07:00
    assert_eq!(output.times_at_targets_each_iteration[12][0], 930 - 420);
    assert_eq!(output.times_at_targets_each_iteration[11][0], UNREACHED);
    Ok(())
}

#[test]
fn a_faster_arrival_mid_pattern_switches_to_an_earlier_trip() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    // two trips on one pattern; the slow access only catches the late
    // trip at A, but B is reached early enough on the street to step back
    // to the early trip and arrive at C with it
    let data = TransitDataBuilder::new("2020-01-01", "2020-01-02")
        .service("day", &["2020-01-01"])
        .pattern(&["A", "B", "C"], |pattern| {
            pattern
                .trip("day", &["00:10:00", "00:11:40", "00:13:20"])
                .trip("day", &["00:15:00", "00:16:40", "00:18:20"]);
        })
        .build();

    // static-site mode : rows are per-stop vehicle arrival times
    let mut worker = RangeRaptor::new(&data, None, request(0, 60))?;
    let output = worker.solve(&[(0, 800), (1, 550)], &PointSetTimes::unreached(3))?;

    let row = &output.times_at_targets_each_iteration[0];
    assert_eq!(row[0], UNREACHED);
    // B is reached by the late trip boarded at A
    assert_eq!(row[1], 1000);
    // C is reached by the early trip, caught at B after the switch
    assert_eq!(row[2], 800);

    let states = output.states_each_iteration.expect("static-site archive");
    let state = &states[0];
    assert_eq!(state.board_pattern(2), Some(0));
    assert_eq!(state.board_stop(2), Some(1));
    assert_eq!(state.board_stop(1), Some(0));
    Ok(())
}

#[test]
fn zero_width_window_still_runs_one_minute() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let data = TransitDataBuilder::new("2020-01-01", "2020-01-02")
        .stop("A")
        .build();
    let targets = LinkedPointSet::new(1, data.nb_of_stops());
    let non_transit = PointSetTimes::new(vec![600]);

    let mut worker = RangeRaptor::new(&data, Some(&targets), request(3600, 3600))?;
    let output = worker.solve(&[(0, 300)], &non_transit)?;

    assert_eq!(output.times_at_targets_each_iteration.len(), 1);
    assert_eq!(output.times_at_targets_each_iteration[0].as_slice(), &[600]);
    Ok(())
}

fn two_leg_network() -> TransitData {
    TransitDataBuilder::new("2020-01-01", "2020-01-02")
        .service("day", &["2020-01-01"])
        .pattern(&["A", "B"], |pattern| {
            pattern
                .trip("day", &["00:10:00", "00:15:00"])
                .trip("day", &["00:11:00", "00:16:00"]);
        })
        .transfer("B", "C", 60)
        .pattern(&["C", "D"], |pattern| {
            pattern.trip("day", &["00:18:20", "00:21:40"]);
        })
        .build()
}

#[test]
fn range_sweep_matches_single_minute_searches() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let access = [(0usize, 30)];
    let data = two_leg_network();
    let baseline = PointSetTimes::unreached(data.nb_of_stops());

    let mut range_worker = RangeRaptor::new(&data, None, request(0, 120))?;
    let range_output = range_worker.solve(&access, &baseline)?;
    assert_state_invariants(&range_worker);
    // a search can never need more rounds than there are stops
    assert!(range_worker.retained_rounds() <= data.nb_of_stops() + 1);

    // the sweep goes from the latest minute to the earliest : row 0 is the
    // departure at 00:01:00, row 1 the departure at 00:00:00
    let mut late_worker = RangeRaptor::new(&data, None, request(60, 120))?;
    let late_output = late_worker.solve(&access, &baseline)?;
    let mut early_worker = RangeRaptor::new(&data, None, request(0, 60))?;
    let early_output = early_worker.solve(&access, &baseline)?;

    assert_eq!(range_output.times_at_targets_each_iteration.len(), 2);
    assert_eq!(
        range_output.times_at_targets_each_iteration[0],
        late_output.times_at_targets_each_iteration[0],
    );
    assert_eq!(
        range_output.times_at_targets_each_iteration[1],
        early_output.times_at_targets_each_iteration[0],
    );
    Ok(())
}

#[test]
fn transfers_chain_onto_a_second_vehicle() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let data = two_leg_network();
    let mut worker = RangeRaptor::new(&data, None, request(0, 60))?;
    let output = worker.solve(&[(0, 30)], &PointSetTimes::unreached(4))?;

    let row = &output.times_at_targets_each_iteration[0];
    // B by the first trip of the first leg
    assert_eq!(row[1], 900);
    // C is transfer-reached only, it never sees a vehicle arrival
    assert_eq!(row[2], UNREACHED);
    // D by the second leg, boarded after the 60s walk from B
    assert_eq!(row[3], 1300);

    let states = output.states_each_iteration.expect("static-site archive");
    let state = &states[0];
    assert_eq!(state.board_stop(3), Some(2));
    assert_eq!(state.transfer_origin(2), Some(1));
    Ok(())
}
