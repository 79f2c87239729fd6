//! Detect a running track in synthetic recordings.
//!
//! Run with: cargo run --example detect_track --features synthetic

use track_finder::synthetic::{random_walk, OvalTrack};
use track_finder::{identify_track, track_to_line, GpsPoint, TrackConfig};

fn main() {
    let config = TrackConfig::default();
    let center = GpsPoint::new(47.3769, 8.5417); // Zurich

    let recordings = vec![
        ("clean oval", OvalTrack::standard(center, 60.0).generate()),
        (
            "noisy oval",
            OvalTrack::standard(center, 60.0).with_jitter(1.5, 7).generate(),
        ),
        ("random walk", random_walk(center, 2000, 3.0, 45.0, 7)),
    ];

    println!("Track Detection Examples\n");
    println!(
        "Config: segments {}-{}m, max mse {}, acceptance fitness {}\n",
        config.min_line_segment, config.max_line_segment, config.max_line_mse, config.acceptance_fitness
    );

    for (i, (name, coords)) in recordings.iter().enumerate() {
        println!("{}. {} ({} coordinates):", i + 1, name, coords.len());
        let inference = identify_track(coords, &config);
        println!("   Parallel pairs considered: {}", inference.parallel_segments.len());
        println!("   Outcome: {}", inference.outcome);

        match &inference.arc {
            Some(shape) => {
                println!("   Bearing: {:.1}°", shape.bearing_degrees);
                println!("   Radii: {:.1}m / {:.1}m", shape.radii.0, shape.radii.1);
                println!("   Fitness: {:.2} / {:.2}", shape.fitness.0, shape.fitness.1);
            }
            None => println!("   No track"),
        }

        if let Some(outline) = track_to_line(Some(&inference)) {
            println!("   Outline: {} points\n", outline.len());
        } else {
            println!();
        }
    }
}
