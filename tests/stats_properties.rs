use viola_analytics::stats::{MetricFormat, format_value, percentile, scale_hints, sorted_present};

fn lcg_values(seed: u64, n: usize) -> Vec<Option<f64>> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let bucket = state >> 33;
            if bucket % 11 == 0 {
                None
            } else {
                Some((bucket % 10_000) as f64 / 10_000.0)
            }
        })
        .collect()
}

#[test]
fn percentile_stays_between_min_and_max() {
    for seed in 1..40u64 {
        let sorted = sorted_present(lcg_values(seed, (seed as usize % 25) + 1));
        if sorted.is_empty() {
            continue;
        }
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
        let mut last = f64::NEG_INFINITY;
        for step in 0..=20 {
            let p = step as f64 / 20.0;
            let v = percentile(&sorted, p).unwrap();
            assert!(min <= v && v <= max, "p={p} v={v}");
            assert!(v >= last - 1e-12, "percentile must not decrease");
            last = v;
        }
        assert_eq!(percentile(&sorted, 0.0), Some(min));
        assert_eq!(percentile(&sorted, 1.0), Some(max));
    }
}

#[test]
fn percent_hints_always_inside_unit_interval() {
    for seed in 1..60u64 {
        let values = lcg_values(seed, (seed as usize % 30) + 1);
        let hints = scale_hints(values.clone(), MetricFormat::Percent);
        if sorted_present(values).is_empty() {
            assert!(hints.is_empty());
            continue;
        }
        let lo = hints.suggested_min.unwrap();
        let hi = hints.suggested_max.unwrap();
        assert!(0.0 <= lo && lo <= hi && hi <= 1.0, "seed {seed}: {lo}..{hi}");
        assert_eq!(hints.min, Some(lo));
        assert_eq!(hints.max, Some(hi));
    }
}

#[test]
fn number_hints_cover_the_trimmed_range() {
    for seed in 1..60u64 {
        let values = lcg_values(seed, 40);
        let sorted = sorted_present(values.clone());
        let hints = scale_hints(values, MetricFormat::Number);
        let lo = hints.suggested_min.unwrap();
        let hi = hints.suggested_max.unwrap();
        assert!(lo < hi);
        assert!(lo <= sorted[sorted.len() / 2] && sorted[sorted.len() / 2] <= hi);
    }
}

#[test]
fn hints_ignore_input_order() {
    let values = lcg_values(7, 33);
    let mut reversed = values.clone();
    reversed.reverse();
    assert_eq!(
        scale_hints(values, MetricFormat::Number),
        scale_hints(reversed, MetricFormat::Number)
    );
}

#[test]
fn display_strings() {
    assert_eq!(format_value(Some(0.5), MetricFormat::Percent), "50.0 %");
    assert_eq!(format_value(Some(-1.005), MetricFormat::Number), "-1.00");
    assert_eq!(format_value(None, MetricFormat::Number), "");
}

#[test]
fn percent_hints_clamp_samples_outside_unit_interval() {
    let inputs: [&[f64]; 5] = [&[5.0], &[5.0, 5.0], &[-0.5], &[-3.0, 40.0, 75.0], &[0.4, 55.0, 60.0]];
    for raw in inputs {
        let values: Vec<Option<f64>> = raw.iter().copied().map(Some).collect();
        let hints = scale_hints(values, MetricFormat::Percent);
        let lo = hints.suggested_min.unwrap();
        let hi = hints.suggested_max.unwrap();
        assert!(0.0 <= lo && lo <= hi && hi <= 1.0, "{raw:?}: {lo}..{hi}");
    }
}

#[test]
fn number_hints_finite_near_float_limits() {
    let values = vec![Some(f64::MAX), Some(f64::MAX), Some(-f64::MAX)];
    let hints = scale_hints(values, MetricFormat::Number);
    assert!(hints.suggested_min.unwrap().is_finite());
    assert!(hints.suggested_max.unwrap().is_finite());
}
