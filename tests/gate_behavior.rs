use audiograb_core::ConcurrencyGate;

#[test]
fn nth_plus_one_admission_is_rejected_until_a_release() {
    for max in [1, 2, 5, 8] {
        let gate = ConcurrencyGate::new(max);
        let mut permits = Vec::with_capacity(max);
        for _ in 0..max {
            permits.push(gate.try_admit().expect("within ceiling"));
        }

        assert!(gate.try_admit().is_none(), "ceiling {max} over-admitted");

        permits.pop();
        assert!(
            gate.try_admit().is_some(),
            "ceiling {max} did not reopen after one release"
        );
    }
}

#[test]
fn in_flight_returns_to_baseline_after_each_path() {
    let gate = ConcurrencyGate::new(5);
    let baseline = gate.in_flight();

    // Normal scoped use.
    {
        let _permit = gate.try_admit().expect("admitted");
        assert_eq!(gate.in_flight(), baseline + 1);
    }
    assert_eq!(gate.in_flight(), baseline);

    // Early-return shaped use: permit dropped by `?`-style bailout.
    fn admitted_then_fails(gate: &ConcurrencyGate) -> Result<(), ()> {
        let _permit = gate.try_admit().ok_or(())?;
        Err(())
    }
    let _ = admitted_then_fails(&gate);
    assert_eq!(gate.in_flight(), baseline);
}

#[test]
fn concurrent_admissions_never_exceed_the_ceiling() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    let gate = ConcurrencyGate::new(4);
    let peak = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(12));

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let gate = gate.clone();
            let peak = Arc::clone(&peak);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                if let Some(_permit) = gate.try_admit() {
                    peak.fetch_max(gate.in_flight(), Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker completes");
    }

    assert!(peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(gate.in_flight(), 0);
}
