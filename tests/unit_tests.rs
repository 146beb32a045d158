// tests/unit_tests.rs
use raster_index::io::reader::parse_table;
use raster_index::processing::indices::tasseled::{BRIGHTNESS, GREENNESS, WETNESS};
use raster_index::processing::indices::{
    BandCopy, ContinuumRemoval, KernelizedNDI, NormalizedRatio, RatioMinusOne, Resistance,
    ResistanceIndex, TasseledCap, TasseledCapComponent, NDI,
};
use raster_index::processing::{IndexCalculator, IndexKind, OutputStatus, CATALOG};
use raster_index::{
    BandConfig, EndmemberTable, Frame, IndexDispatcher, IndexError, IndexRequest,
    ParallelProcessor, ReflectanceStack, TimeSeries,
};

const NODATA: i16 = -9999;

/// Helper function to build a single-date stack from per-band cell values
fn create_test_stack(bands: &[&[i16]]) -> ReflectanceStack {
    let frame = Frame::all_valid(bands.iter().map(|b| b.to_vec()).collect()).unwrap();
    ReflectanceStack::new(vec![frame]).unwrap()
}

/// Helper function to run a calculator and return the first date
fn run<I: IndexCalculator>(calculator: &I, stack: &ReflectanceStack) -> Vec<i16> {
    let processor = ParallelProcessor::new(Some(2)).unwrap();
    let mut output = TimeSeries::for_stack(stack, NODATA);
    processor.process(calculator, stack, None, &mut output).unwrap();
    output.date(0).to_vec()
}

/// Landsat-like stack: blue, green, red, nir, swir1, swir2 for each cell
fn landsat_stack(cells: &[[i16; 6]]) -> ReflectanceStack {
    let bands: Vec<Vec<i16>> = (0..6)
        .map(|b| cells.iter().map(|c| c[b]).collect())
        .collect();
    let frame = Frame::all_valid(bands).unwrap();
    ReflectanceStack::new(vec![frame]).unwrap()
}

/// Deterministic pseudo-random reflectance
fn lcg(seed: &mut u64) -> i16 {
    *seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((*seed >> 33) % 6000) as i16 + 100
}

/// Test NDI calculation with known values
#[test]
fn test_ndi_calculation() {
    let test_cases = [
        // A, B, expected
        (5000, 3000, 2500),   // (5000-3000)/(5000+3000) = 0.25
        (5000, 2500, 3333),   // 0.33333 truncated
        (3000, 3000, 0),      // equal bands
        (1000, 3000, -5000),  // negative index
        (0, 0, NODATA),       // divide by zero
        (5000, -2500, NODATA), // ratio of 3 is out of [-1, 1]
    ];

    let a: Vec<i16> = test_cases.iter().map(|c| c.0).collect();
    let b: Vec<i16> = test_cases.iter().map(|c| c.1).collect();
    let stack = create_test_stack(&[&a, &b]);

    let result = run(&NDI::new(0, 1, None), &stack);

    for (i, (_, _, expected)) in test_cases.iter().enumerate() {
        assert_eq!(result[i], *expected, "case {i}");
    }
}

/// NDI must equal the truncated scaled ratio wherever it is defined
#[test]
fn test_ndi_matches_truncated_formula() {
    let values: [i16; 9] = [-2000, -1, 0, 1, 250, 999, 3000, 8000, 16000];
    let mut a = Vec::new();
    let mut b = Vec::new();
    for &x in &values {
        for &y in &values {
            a.push(x);
            b.push(y);
        }
    }
    let stack = create_test_stack(&[&a, &b]);
    let result = run(&NDI::new(0, 1, None), &stack);

    for i in 0..a.len() {
        let (x, y) = (a[i] as f32, b[i] as f32);
        let sum = x + y;
        let ratio = (x - y) / sum;
        let expected = if sum == 0.0 || !(-1.0..=1.0).contains(&ratio) {
            NODATA
        } else {
            (ratio * 10000.0) as i16
        };
        assert_eq!(result[i], expected, "a={x}, b={y}");
    }
}

/// Masked cells and invalid observations are nodata on every date
#[test]
fn test_masked_cells_are_nodata() {
    let frames = vec![
        Frame::new(vec![vec![5000, 5000, 5000], vec![3000, 3000, 3000]], vec![true, true, false]).unwrap(),
        Frame::new(vec![vec![4000, 4000, 4000], vec![1000, 1000, 1000]], vec![true, true, true]).unwrap(),
    ];
    let stack = ReflectanceStack::new(frames).unwrap();
    let mask = [true, false, true];

    let processor = ParallelProcessor::new(Some(3)).unwrap();
    let mut output = TimeSeries::for_stack(&stack, NODATA);
    processor
        .process(&NDI::new(0, 1, None), &stack, Some(&mask), &mut output)
        .unwrap();

    // cell 0: computed on both dates
    assert_eq!(output.get(0, 0), 2500);
    assert_eq!(output.get(1, 0), 6000);
    // cell 1: masked out everywhere
    assert_eq!(output.get(0, 1), NODATA);
    assert_eq!(output.get(1, 1), NODATA);
    // cell 2: invalid on the first date only
    assert_eq!(output.get(0, 2), NODATA);
    assert_eq!(output.get(1, 2), 6000);
}

#[test]
fn test_mask_length_is_checked() {
    let stack = create_test_stack(&[&[1, 2], &[3, 4]]);
    let processor = ParallelProcessor::new(Some(1)).unwrap();
    let mut output = TimeSeries::for_stack(&stack, NODATA);
    let err = processor
        .process(&NDI::new(0, 1, None), &stack, Some(&[true]), &mut output)
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidStack(_)));
}

#[test]
fn test_ratio_minus_one() {
    let a = [6000, 1234, 30000, 1000];
    let b = [2000, 0, 1, 4000];
    let stack = create_test_stack(&[&a, &b]);

    let result = run(&RatioMinusOne::new(0, 1, None), &stack);

    assert_eq!(result[0], 2000); // (3 - 1) * 1000
    assert_eq!(result[1], NODATA); // zero denominator
    assert_eq!(result[2], NODATA); // 29999000 does not fit
    assert_eq!(result[3], -750); // (0.25 - 1) * 1000
}

#[test]
fn test_normalized_ratio() {
    let a = [8000, 1000, -5000, 2000];
    let b = [2000, 0, 1000, 2000];
    let stack = create_test_stack(&[&a, &b]);

    let result = run(&NormalizedRatio::new(0, 1, None), &stack);

    // (4 - 1) / sqrt(5) = 1.34164
    assert_eq!(result[0], 13416);
    assert_eq!(result[1], NODATA);
    // ratio of -5 has no real square root
    assert_eq!(result[2], NODATA);
    assert_eq!(result[3], 0);
}

#[test]
fn test_kernelized_ndi() {
    let a = [4000, 3000, 0, 2000, -100];
    let b = [2000, 3000, 2000, 0, 500];
    let stack = create_test_stack(&[&a, &b]);

    let result = run(&KernelizedNDI::new(0, 1, None), &stack);

    let (x, y) = (4000.0f32, 2000.0f32);
    let sigma = 0.5 * (x + y);
    let k = (-((x - y) * (x - y)) / (2.0 * sigma * sigma)).exp();
    assert_eq!(result[0], ((1.0 - k) / (1.0 + k) * 10000.0) as i16);
    assert!((1100..1110).contains(&result[0]));

    assert_eq!(result[1], 0);
    assert_eq!(result[2], NODATA);
    assert_eq!(result[3], NODATA);
    assert_eq!(result[4], NODATA);
}

#[test]
fn test_resistance_indices() {
    // nir, red, blue
    let nir = [5000, 5000, 0];
    let red = [2500, 2000, 0];
    let blue = [1500, 1000, 0];
    let stack = create_test_stack(&[&nir, &red, &blue]);

    // EVI: 2.5 * 2500 / (5000 + 6*2500 - 7.5*1500 + 10000) = 0.3333
    let evi = run(&ResistanceIndex::new(0, 1, 2, Resistance::EVI, None), &stack);
    assert_eq!(evi[0], 3333);

    // SARVI: red' = 2000 - (1000 - 2000) = 3000; 1.5 * 2000 / (5000 + 3000 + 5000)
    let sarvi = run(&ResistanceIndex::new(0, 1, 2, Resistance::SARVI, None), &stack);
    assert_eq!(sarvi[1], 2307);

    // ARVI has no offset, so an all-zero spectrum has a zero denominator
    let arvi = run(&ResistanceIndex::new(0, 1, 2, Resistance::ARVI, None), &stack);
    assert_eq!(arvi[2], NODATA);
}

#[test]
fn test_tasseled_cap_disturbance() {
    let spectrum: [i16; 6] = [500, 800, 600, 3000, 2000, 1000];
    let stack = landsat_stack(&[spectrum]);

    let project = |c: &[f32; 6]| -> f64 {
        c.iter()
            .zip(spectrum)
            .map(|(&c, v)| c as f64 * v as f64)
            .sum()
    };
    let expected = project(&BRIGHTNESS) - project(&GREENNESS) - project(&WETNESS);

    let tc = TasseledCap::new(TasseledCapComponent::Disturbance, [0, 1, 2, 3, 4, 5], None);
    let result = run(&tc, &stack);

    assert_eq!(result[0], expected as i16);
    assert_eq!(result[0], 2838);
}

#[test]
fn test_tasseled_cap_components() {
    let spectrum: [i16; 6] = [500, 800, 600, 3000, 2000, 1000];
    let stack = landsat_stack(&[spectrum]);
    let bands = [0, 1, 2, 3, 4, 5];

    let brightness = run(&TasseledCap::new(TasseledCapComponent::Brightness, bands, None), &stack);
    let greenness = run(&TasseledCap::new(TasseledCapComponent::Greenness, bands, None), &stack);
    let wetness = run(&TasseledCap::new(TasseledCapComponent::Wetness, bands, None), &stack);

    assert_eq!(brightness[0], 3343);
    assert_eq!(greenness[0], 1635);
    assert_eq!(wetness[0], -1130);
}

#[test]
fn test_continuum_removal() {
    // swir1, nir, swir2
    let stack = create_test_stack(&[&[2000], &[3000], &[1000]]);
    let cr = ContinuumRemoval::new((0, 1.61), (1, 0.865), (2, 2.19), None);

    let result = run(&cr, &stack);

    // continuum at 1.61 um: (3000 * 0.58 + 1000 * 0.745) / 1.325 = 1875.47
    assert_eq!(result[0], 124);
}

#[test]
fn test_band_copy() {
    let stack = create_test_stack(&[&[1, -2, 32767], &[4, 5, 6]]);
    let result = run(&BandCopy::new(0, None), &stack);
    assert_eq!(result, vec![1, -2, 32767]);
}

/// Test that custom names are properly set
#[test]
fn test_custom_index_names() {
    let ndi = NDI::new(0, 1, Some("Custom NDI Name".to_string()));
    assert_eq!(ndi.name(), "Custom NDI Name");

    let evi = ResistanceIndex::new(0, 1, 2, Resistance::EVI, None);
    assert_eq!(evi.name(), "EVI");
}

/// Test that required_bands lists every band a calculator reads
#[test]
fn test_required_bands() {
    assert_eq!(NDI::new(3, 2, None).required_bands(), vec![3, 2]);
    assert_eq!(
        ResistanceIndex::new(3, 2, 0, Resistance::EVI, None).required_bands(),
        vec![3, 2, 0]
    );
    assert_eq!(
        TasseledCap::new(TasseledCapComponent::Wetness, [0, 1, 2, 3, 4, 5], None)
            .required_bands()
            .len(),
        6
    );
}

#[test]
fn test_catalog_is_in_kind_order() {
    for (i, entry) in CATALOG.iter().enumerate() {
        assert_eq!(entry.kind as usize, i, "{} is out of place", entry.name);
        assert_eq!(entry.kind.entry().name, entry.name);
    }
    assert_eq!(IndexKind::all().count(), CATALOG.len());
}

#[test]
fn test_index_identifiers_parse_case_insensitively() {
    assert_eq!("NDVI".parse::<IndexKind>().unwrap(), IndexKind::Ndvi);
    assert_eq!("kndvi".parse::<IndexKind>().unwrap(), IndexKind::Kndvi);
    assert_eq!("NDVIre1n".parse::<IndexKind>().unwrap(), IndexKind::NdviRedEdge1Narrow);
    assert_eq!(" tc-di ".parse::<IndexKind>().unwrap(), IndexKind::TcDisturbance);
    assert_eq!(
        "NOPE".parse::<IndexKind>(),
        Err(IndexError::UnknownIndex("NOPE".to_string()))
    );
    assert_eq!(IndexKind::Sma.to_string(), "SMA");
}

#[test]
fn test_unknown_index_is_skipped() {
    let stack = landsat_stack(&[[500, 800, 600, 3000, 2000, 1000], [400, 700, 500, 2500, 1800, 900]]);
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(2)).unwrap(), BandConfig::landsat());
    let request = IndexRequest {
        indices: vec!["NDVI".into(), "FOO".into(), "RE1".into(), "NBR".into()],
        nodata: NODATA,
        ..IndexRequest::default()
    };

    let outputs = dispatcher.compute(&request, &stack, None, None).unwrap();
    assert_eq!(outputs.len(), 4);

    assert_eq!(outputs[0].status, OutputStatus::Computed);
    assert_eq!(outputs[0].series.get(0, 0), 6666);

    // unknown identifier
    assert!(matches!(outputs[1].status, OutputStatus::Skipped { .. }));
    assert_eq!(outputs[1].kind, None);
    assert!(outputs[1].series.is_all_nodata());

    // landsat has no red edge
    assert!(matches!(outputs[2].status, OutputStatus::Skipped { .. }));
    assert_eq!(outputs[2].kind, Some(IndexKind::RedEdge1));
    assert!(outputs[2].series.is_all_nodata());

    // later indices still run: (3000 - 1000) / 4000
    assert_eq!(outputs[3].status, OutputStatus::Computed);
    assert_eq!(outputs[3].series.get(0, 0), 5000);
}

#[test]
fn test_band_outside_stack_is_skipped() {
    // nir configured at a band the stack does not have
    let bands = BandConfig::landsat().with(raster_index::Band::Nir, 9);
    let stack = landsat_stack(&[[500, 800, 600, 3000, 2000, 1000]]);
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(1)).unwrap(), bands);

    let mut output = TimeSeries::for_stack(&stack, NODATA);
    let err = dispatcher
        .spectral_index("NDVI", &stack, None, None, &mut output, None)
        .unwrap_err();
    assert!(matches!(err, IndexError::BandOutOfRange { band: 9, .. }));
    assert!(!err.is_fatal());
    assert!(output.is_all_nodata());
}

#[test]
fn test_each_algorithm_is_cited_once() {
    let stack = landsat_stack(&[[500, 800, 600, 3000, 2000, 1000]]);
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(1)).unwrap(), BandConfig::landsat());
    let request = IndexRequest {
        indices: vec!["NDVI".into(), "NDVI".into(), "ARVI".into(), "SARVI".into(), "BLUE".into()],
        ..IndexRequest::default()
    };

    dispatcher.compute(&request, &stack, None, None).unwrap();

    // ARVI and SARVI share a reference, band copies have none
    assert_eq!(dispatcher.citations().len(), 2);
}

#[test]
fn test_sma_without_endmember_is_fatal() {
    let stack = landsat_stack(&[[500, 800, 600, 3000, 2000, 1000]]);
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(1)).unwrap(), BandConfig::landsat());
    let request = IndexRequest {
        indices: vec!["NDVI".into(), "SMA".into()],
        ..IndexRequest::default()
    };

    let err = dispatcher.compute(&request, &stack, None, None).unwrap_err();
    assert_eq!(err, IndexError::MissingEndmember);
    assert!(err.is_fatal());
}

#[test]
fn test_endmember_band_mismatch_aborts() {
    let stack = landsat_stack(&[[500, 800, 600, 3000, 2000, 1000]]);
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(1)).unwrap(), BandConfig::landsat());
    let endmember = EndmemberTable::from_rows(vec![vec![0.1, 0.2]; 4]).unwrap();
    let request = IndexRequest {
        indices: vec!["NDVI".into(), "SMA".into()],
        ..IndexRequest::default()
    };

    let err = dispatcher
        .compute(&request, &stack, None, Some(&endmember))
        .unwrap_err();
    assert_eq!(
        err,
        IndexError::EndmemberBandMismatch {
            endmember: 4,
            stack: 6
        }
    );
    // nothing was computed before the check
    assert!(dispatcher.citations().is_empty());
}

#[test]
fn test_results_do_not_depend_on_thread_count() {
    let mut seed = 42u64;
    let n_cells = 997;
    let frames = (0..3)
        .map(|t| {
            let bands = (0..6)
                .map(|_| (0..n_cells).map(|_| lcg(&mut seed)).collect())
                .collect();
            let valid = (0..n_cells).map(|p| (p + t) % 7 != 0).collect();
            Frame::new(bands, valid).unwrap()
        })
        .collect();
    let stack = ReflectanceStack::new(frames).unwrap();
    let mask: Vec<bool> = (0..n_cells).map(|p| p % 11 != 0).collect();

    let endmember = EndmemberTable::from_rows(vec![
        vec![0.03, 0.10, 0.0],
        vec![0.06, 0.14, 0.0],
        vec![0.04, 0.18, 0.0],
        vec![0.45, 0.25, 0.0],
        vec![0.25, 0.32, 0.0],
        vec![0.12, 0.30, 0.0],
    ])
    .unwrap();

    let request = IndexRequest {
        indices: ["NDVI", "EVI", "kNDVI", "TC-DI", "CRSWIR", "SMA"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ..IndexRequest::default()
    };

    let compute = |threads| {
        let dispatcher =
            IndexDispatcher::new(ParallelProcessor::new(Some(threads)).unwrap(), BandConfig::landsat());
        dispatcher
            .compute(&request, &stack, Some(&mask), Some(&endmember))
            .unwrap()
    };

    let single = compute(1);
    let many = compute(4);
    for (a, b) in single.iter().zip(&many) {
        assert_eq!(a.status, OutputStatus::Computed, "{}", a.name);
        assert_eq!(a.series, b.series, "{} differs between thread counts", a.name);
    }
    // idempotent on the same processor
    assert_eq!(compute(4)[5].series, many[5].series);
}

#[test]
fn test_parse_table() {
    let table = parse_table("# veg soil\n 300 1000\n600 1400\n\n450 2500\n").unwrap();
    assert_eq!(table, vec![vec![300.0, 1000.0], vec![600.0, 1400.0], vec![450.0, 2500.0]]);

    assert!(parse_table("1 2\n3\n").is_err());
    assert!(parse_table("1 x\n").is_err());
}

#[test]
fn test_continuum_removal_needs_wavelengths() {
    // explicit mapping without center wavelengths
    let bands = BandConfig::default()
        .with(raster_index::Band::Nir, 0)
        .with(raster_index::Band::Swir1, 1)
        .with(raster_index::Band::Swir2, 2);
    let stack = create_test_stack(&[&[3000], &[2000], &[1000]]);
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(1)).unwrap(), bands.clone());
    let request = IndexRequest {
        indices: vec!["CRSWIR".into(), "NDMI".into()],
        ..IndexRequest::default()
    };

    let outputs = dispatcher.compute(&request, &stack, None, None).unwrap();
    assert!(matches!(outputs[0].status, OutputStatus::Skipped { .. }));
    assert!(outputs[0].series.is_all_nodata());
    assert_eq!(outputs[1].status, OutputStatus::Computed);

    let mut output = TimeSeries::for_stack(&stack, NODATA);
    let err = dispatcher
        .spectral_index("CRSWIR", &stack, None, None, &mut output, None)
        .unwrap_err();
    assert_eq!(err, IndexError::MissingWavelength { index: "CRSWIR" });
    assert!(!err.is_fatal());

    // equal neighbour wavelengths cannot span a continuum either
    let mut flat = bands;
    flat.w_nir = 1.6;
    flat.w_swir1 = 1.6;
    flat.w_swir2 = 1.6;
    let dispatcher = IndexDispatcher::new(ParallelProcessor::new(Some(1)).unwrap(), flat);
    assert!(dispatcher.resolve("CRSWIR").is_err());
}

#[test]
fn test_thread_count_is_bounded_by_hardware() {
    let available = num_cpus::get();
    assert_eq!(ParallelProcessor::new(Some(available + 64)).unwrap().threads(), available);
    assert_eq!(ParallelProcessor::new(Some(0)).unwrap().threads(), 1);
    assert_eq!(ParallelProcessor::new(None).unwrap().threads(), available);
}

#[test]
fn test_output_is_written_date_major() {
    let (n_dates, n_cells) = (3, 37);
    let frames = (0..n_dates)
        .map(|t| {
            let band = (0..n_cells).map(|p| (100 * t + p) as i16).collect();
            let valid = (0..n_cells).map(|p| p != 5 || t != 1).collect();
            Frame::new(vec![band], valid).unwrap()
        })
        .collect();
    let stack = ReflectanceStack::new(frames).unwrap();
    let processor = ParallelProcessor::new(Some(4)).unwrap();
    let copy = BandCopy::new(0, None);

    let mut output = TimeSeries::for_stack(&stack, NODATA);
    processor.process(&copy, &stack, None, &mut output).unwrap();
    for t in 0..n_dates {
        for p in 0..n_cells {
            let expected = if p == 5 && t == 1 { NODATA } else { (100 * t + p) as i16 };
            assert_eq!(output.get(t, p), expected, "date {t}, cell {p}");
        }
    }

    // a reused series is fully overwritten
    let mask: Vec<bool> = (0..n_cells).map(|p| p % 2 == 0).collect();
    processor.process(&copy, &stack, Some(&mask), &mut output).unwrap();
    for t in 0..n_dates {
        assert_eq!(output.get(t, 1), NODATA);
        assert_eq!(output.get(t, 2), (100 * t + 2) as i16);
    }
}
