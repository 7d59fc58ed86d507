use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use hybsim::{
    resolve, FragmentationEngine, MutationPolicy, Outcome, ProbeBuilder, RegionKind, RegionMutator,
    SequenceGenerator, SimulationConfig, SimulationDriver, SimulationError, StructureAnnotator, Target,
    TargetKind,
};

fn four_way_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.seed = 5671;
    config.target.length = 1100;
    config.target.gc_content = 0.32;
    config.target.intron_count = 2;
    config.mutation = MutationPolicy::Divergence { exon: 0.0, intron: 0.5 };
    config.complementarity_threshold = 0.8;
    config.trials = 10;
    config
}

#[test]
fn test_four_way_tally_covers_every_trial() {
    let driver = SimulationDriver::new(four_way_config()).unwrap();
    let report = driver.run_hybridization().unwrap();
    assert_eq!(report.trials, 10);
    let sum: usize = report.tally.iter().map(|(_, count)| count).sum();
    assert_eq!(sum, 10);
    assert_eq!(report.tally.total(), 10);
}

#[test]
fn test_zero_threshold_hybridizes_both() {
    let mut config = four_way_config();
    config.complementarity_threshold = 0.0;
    config.trials = 200;
    let report = SimulationDriver::new(config).unwrap().run_hybridization().unwrap();
    assert!(report.tally.get(Outcome::Both) >= 190);
    assert_eq!(report.tally.get(Outcome::Neither), 0);
}

#[test]
fn test_intronless_target() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5671);
    let structure = StructureAnnotator::default().annotate(1100, 0, &mut rng).unwrap();
    assert_eq!(structure.regions().len(), 1);
    assert_eq!(structure.regions()[0].kind, RegionKind::Exon);
    assert_eq!(structure.sequence_length(), 1100);

    let target = Target::generate(
        &SequenceGenerator::default(),
        &StructureAnnotator::default(),
        1100,
        0.32,
        0,
        &mut rng,
    )
    .unwrap();
    assert_eq!(target.kind, TargetKind::Intronless);

    // an intron-only distance cannot be applied without introns
    let intron_only = RegionMutator::new(MutationPolicy::HammingDistance { exon: 0, intron: 5 }).unwrap();
    assert!(matches!(
        intron_only.mutate(&target, &mut rng),
        Err(SimulationError::InvalidParameter { .. })
    ));

    // with an exon term the intron term is simply unused
    let mixed = RegionMutator::new(MutationPolicy::HammingDistance { exon: 3, intron: 5 }).unwrap();
    let (mutant, mutations) = mixed.mutate_recorded(&target, &mut rng).unwrap();
    assert_eq!(mutations.len(), 3);
    assert_eq!(mutant.len(), target.len());
}

#[test]
fn test_reads_match_target_length() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let target = Target::generate(
        &SequenceGenerator::default(),
        &StructureAnnotator::default(),
        1500,
        0.4,
        3,
        &mut rng,
    )
    .unwrap();
    let probe = ProbeBuilder::new(3000, 0.5).build_probe(&target, 1200, &mut rng).unwrap();
    let engine = FragmentationEngine::new(100, 1100).unwrap();
    for _ in 0..100 {
        let read = engine.fragment(&probe, target.len(), &mut rng).unwrap();
        assert_eq!(read.len(), target.len());
    }
}

#[test]
fn test_fragment_info_round_trip() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
    let target = Target::generate(
        &SequenceGenerator::default(),
        &StructureAnnotator::default(),
        2000,
        0.32,
        4,
        &mut rng,
    )
    .unwrap();
    for (start, end) in &[(0, 1999), (10, 20), (500, 1500), (1999, 1999)] {
        let info = resolve(&target.structure, *start, *end).unwrap();
        let total: usize = info.local.regions().iter().map(|r| r.len()).sum();
        assert_eq!(total, end - start + 1);
        assert_eq!(info, resolve(&target.structure, *start, *end).unwrap());
    }
}
