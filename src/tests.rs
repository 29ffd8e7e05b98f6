use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    gates::{GATES_FIXED, ROT_XYZ},
    math::{C, N, PI, R},
    prelude::*,
};

fn full_set() -> GateSet {
    GateSet::new(vec![
        VariantSpec::Fixed {
            table: &GATES_FIXED,
            policy: ControlPolicy::Any,
        },
        VariantSpec::Rot {
            families: &ROT_XYZ,
            policy: ControlPolicy::None,
        },
        VariantSpec::CPhase {
            policy: ControlPolicy::Any,
        },
        VariantSpec::Su2 {
            policy: ControlPolicy::None,
        },
        VariantSpec::Swap,
        VariantSpec::CNot {
            policy: ControlPolicy::One,
        },
    ])
}

fn random_genotype(set: &GateSet, cfg: &Config, len: N, rng: &mut StdRng) -> Vec<Gene> {
    (0..len).map(|_| Gene::random(set, cfg, rng)).collect()
}

fn simulate_raw(gt: &[Gene], psi: State, ctx: &Context) -> State {
    gt.iter().fold(psi, |psi, g| g.apply(&psi, ctx))
}

fn states_close(a: &State, b: &State, eps: R) -> bool {
    (0..a.dim()).all(|i| (a[i] - b[i]).norm() < eps)
}

#[test]
fn canonicalization_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(41);
    let cfg = Config::default();
    let set = full_set();
    for _ in 0..60 {
        let gt = random_genotype(&set, &cfg, 25, &mut rng);
        let once = Candidate::new(gt);
        let twice = Candidate::new(once.genotype().to_vec());
        assert_eq!(format!("{}", once), format!("{}", twice));
    }
}

#[test]
fn stored_genotypes_contain_no_trivial_gene() {
    let mut rng = StdRng::seed_from_u64(42);
    let cfg = Config::default();
    let set = full_set();
    for _ in 0..40 {
        let mut gt = random_genotype(&set, &cfg, 12, &mut rng);
        // Salt the genotype with explicit identities.
        gt.insert(3, Gene::new(crate::gates::Swap::identity().into()));
        gt.insert(7, Gene::new(crate::gates::CNot::identity(ControlPolicy::One).into()));
        gt.push(Gene::new(crate::gates::Swap::identity().into()));
        let cand = Candidate::new(gt);
        assert!(cand.genotype().iter().all(|g| !g.is_trivial()));
    }
}

#[test]
fn canonicalization_preserves_the_unitary() {
    let mut rng = StdRng::seed_from_u64(43);
    let cfg = Config::default();
    let set = full_set();
    let ctx = Context::default();
    for _ in 0..30 {
        let gt = random_genotype(&set, &cfg, 20, &mut rng);
        let cand = Candidate::new(gt.clone());
        for idx in 0..1 << cfg.n_bit {
            let reference = simulate_raw(&gt, State::basis(cfg.n_bit, idx), &ctx);
            let merged = cand.simulate(State::basis(cfg.n_bit, idx), &ctx);
            assert!(states_close(&reference, &merged, 1e-12));
        }
    }
}

#[test]
fn table_merges_follow_the_squaring_relations() {
    let set = full_set();
    let merged = Candidate::parse("T1 T1", &set, 3).unwrap();
    assert_eq!(format!("{}", merged), "S1");
    let merged = Candidate::parse("S2 S2", &set, 3).unwrap();
    assert_eq!(format!("{}", merged), "Z2");
    let merged = Candidate::parse("H3 H3", &set, 3).unwrap();
    assert!(merged.is_empty());
}

#[test]
fn invert_is_an_involution() {
    let mut rng = StdRng::seed_from_u64(44);
    let cfg = Config::default();
    let set = full_set();
    let ctx = Context::default();
    for _ in 0..120 {
        let g = Gene::random(&set, &cfg, &mut rng);
        let mut back = g.clone();
        back.invert();
        back.invert();
        assert_eq!(format!("{}", g), format!("{}", back));
        for idx in 0..1 << cfg.n_bit {
            let a = g.apply(&State::basis(cfg.n_bit, idx), &ctx);
            let b = back.apply(&State::basis(cfg.n_bit, idx), &ctx);
            assert!(states_close(&a, &b, 1e-12));
        }
    }
}

#[test]
fn swap_qubits_is_an_involution() {
    let mut rng = StdRng::seed_from_u64(45);
    let cfg = Config::default();
    let set = full_set();
    for _ in 0..150 {
        let g = Gene::random(&set, &cfg, &mut rng);
        for (s1, s2) in [(0, 1), (0, 2), (1, 2)] {
            let mut back = g.clone();
            back.swap_qubits(s1, s2);
            back.swap_qubits(s1, s2);
            assert_eq!(
                format!("{}", g),
                format!("{}", back),
                "swap({}, {}) not an involution",
                s1,
                s2
            );
        }
    }
}

#[test]
fn reversed_inverted_suffix_cancels_the_circuit() {
    let mut rng = StdRng::seed_from_u64(46);
    let cfg = Config::default();
    let set = full_set();
    let ctx = Context::default();
    for _ in 0..25 {
        let gt = random_genotype(&set, &cfg, 12, &mut rng);
        let mut full = gt.clone();
        let mut tail = gt;
        for g in &mut tail {
            g.invert();
        }
        tail.reverse();
        full.extend(tail);
        let cand = Candidate::new(full);
        for idx in 0..1 << cfg.n_bit {
            let out = cand.simulate(State::basis(cfg.n_bit, idx), &ctx);
            assert!(
                states_close(&out, &State::basis(cfg.n_bit, idx), 1e-10),
                "identity violated on |{}⟩ by {}",
                idx,
                cand
            );
        }
    }
}

#[test]
fn dominance_refines_the_total_order() {
    let mut rng = StdRng::seed_from_u64(47);
    let random_fitness = |rng: &mut StdRng| {
        let mut counter = Counter::new();
        for _ in 0..rng.gen_range(0..4) {
            counter.hit(Tag::Swap);
        }
        Fitness::new(
            vec![
                trim_error(rng.gen_range(0. ..1.)),
                rng.gen_range(0. ..4.0_f64).floor(),
            ],
            counter,
        )
    };
    for _ in 0..500 {
        let a = random_fitness(&mut rng);
        let b = random_fitness(&mut rng);
        if a.dominates(&b) {
            assert_eq!(a.lex_cmp(&b), std::cmp::Ordering::Less);
            assert!(!b.dominates(&a));
        }
    }
}

#[test]
fn genes_round_trip_through_text() {
    let mut rng = StdRng::seed_from_u64(48);
    let cfg = Config::default();
    let set = full_set();
    let ctx = Context::default();
    for _ in 0..200 {
        let g = Gene::random(&set, &cfg, &mut rng);
        let text = format!("{}", g);
        let parsed = set
            .parse_token(&text, cfg.n_bit)
            .unwrap_or_else(|| panic!("own serialization `{}` did not parse", text));
        let parsed = Gene::new(parsed);
        for idx in 0..1 << cfg.n_bit {
            let a = g.apply(&State::basis(cfg.n_bit, idx), &ctx);
            let b = parsed.apply(&State::basis(cfg.n_bit, idx), &ctx);
            assert!(
                states_close(&a, &b, 1e-12),
                "`{}` re-parsed to a different unitary",
                text
            );
        }
    }
}

// Scenario: the fixed reference circuit round-trips and matches the state
// computed directly from the gate matrices.
#[test]
fn reference_circuit_round_trip_and_state() {
    let set = full_set();
    let text = "H1 H2 H3 P123(0.25π) SWAP12 SWAP23";
    let cand = Candidate::parse(text, &set, 3).unwrap();
    assert_eq!(format!("{}", cand), text);
    let again = Candidate::parse(&format!("{}", cand), &set, 3).unwrap();
    assert_eq!(format!("{}", again), text);

    let psi = cand.simulate(State::basis(3, 0), &Context::default());
    let amp = 1. / 8f64.sqrt();
    for idx in 0..8 {
        let expected = if idx == 7 {
            C::from_polar(amp, 0.25 * PI)
        } else {
            C { re: amp, im: 0. }
        };
        assert!(
            (psi[idx] - expected).norm() < 1e-12,
            "amplitude {} is {} instead of {}",
            idx,
            psi[idx],
            expected
        );
    }
}

// Scenario: the canonical merge collapses an explicit genotype.
#[test]
fn canonical_merge_of_the_reference_genotype() {
    let set = full_set();
    let cand = Candidate::parse("X1(0.2π) X1(0.3π) Y2(0π) H3", &set, 3).unwrap();
    assert_eq!(cand.len(), 2);
    assert_eq!(format!("{}", cand.genotype()[1]), "H3");

    let reference = Candidate::parse("X1(0.5π) H3", &set, 3).unwrap();
    assert!(cand.same_circ(&reference));
    let ctx = Context::default();
    for idx in 0..8 {
        let a = cand.simulate(State::basis(3, idx), &ctx);
        let b = reference.simulate(State::basis(3, idx), &ctx);
        assert!(states_close(&a, &b, 1e-12));
    }
}

// Scenario: 3-qubit target-state preparation over {I, H, T, Ti}.
#[test]
fn evolves_a_state_preparation_circuit() {
    for seed in [1, 2, 3, 4, 5] {
        let cfg = Config {
            n_gen: 50,
            pop_size: 10,
            exp_length_ini: 30.,
            ..Config::default()
        };
        let n_bit = cfg.n_bit;
        let mut evo = Evolution::new(StatePrep::new(&cfg, 0b011), cfg);
        let mut rng = StdRng::seed_from_u64(seed);
        let pop = evo.run(&mut rng);
        let best = pop.best().unwrap();
        if best.fitness().error() <= 1. / (1u64 << 16) as R {
            let psi = best
                .candidate()
                .simulate(State::basis(n_bit, 0), &Context::default());
            let fidelity = State::overlap(&State::basis(n_bit, 0b011), &psi)
                .norm()
                .powi(2);
            assert!(fidelity >= 0.99, "trimmed error lied: fidelity {}", fidelity);
            return;
        }
    }
    panic!("no seed prepared |011⟩ within the trimmed-error target");
}

// Scenario: 3-qubit QFT synthesis over {Y-rot, CPhase, SWAP}.
#[test]
fn evolves_a_fourier_transform_circuit() {
    for seed in [1, 2, 3] {
        let cfg = Config {
            n_gen: 200,
            pop_size: 10,
            pop_size2: 200,
            ..Config::default()
        };
        let mut evo = Evolution::new(Fourier::new(), cfg);
        let mut rng = StdRng::seed_from_u64(seed);
        let pop = evo.run(&mut rng);
        // error = 1 − |average overlap| ≤ 0.02 ⇔ average fidelity ≥ 0.98
        if pop.best().unwrap().fitness().error() <= 0.02 {
            return;
        }
    }
    panic!("no seed approximated the Fourier transform");
}

// Scenario: oracle search over {Oracle, X-rot, CPhase}; the front must
// offer a two-query candidate with bounded worst-case error.
#[test]
fn evolves_a_two_query_oracle_search() {
    for seed in [1, 2, 3] {
        let cfg = Config {
            n_gen: 300,
            pop_size: 10,
            pop_size2: 200,
            ..Config::default()
        };
        let mut evo = Evolution::new(Search::new(), cfg);
        let mut rng = StdRng::seed_from_u64(seed);
        let pop = evo.run(&mut rng);
        let found = pop.front().into_iter().any(|m| {
            m.fitness().counter().get(Tag::Oracle) == 2 && m.fitness().main()[1] <= 0.25
        });
        if found {
            return;
        }
    }
    panic!("no seed produced a two-query search circuit");
}
