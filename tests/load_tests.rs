#[cfg(test)]
mod tests {
    use prio_pool::pool::{Config, ThreadPool};
    use std::{
        sync::{
            atomic::{AtomicU64, AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    fn is_prime(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }

    #[test]
    fn load_test_1_resize_while_submitting() {
        println!("\n=== LOAD TEST 1: grow/shrink посреди отправки ===");
        let pool = ThreadPool::new(5);
        pool.start().unwrap();

        let sum = Arc::new(AtomicU64::new(0));
        measure("100 задач с изменением размера", || {
            for i in 1..=100_u64 {
                if i == 10 {
                    pool.grow(10).unwrap();
                }
                if i == 70 {
                    pool.shrink(14).unwrap();
                }
                let sum = sum.clone();
                pool.submit(i as i64, move || {
                    sum.fetch_add(i, Ordering::SeqCst);
                })
                .unwrap();
            }
            pool.log_snapshot();
            pool.drain_and_stop().unwrap();
        });

        assert_eq!(sum.load(Ordering::SeqCst), 5050);
        assert_eq!(pool.snapshot().counts(), (0, 0, 0));
    }

    #[test]
    fn load_test_2_prime_counting() {
        println!("\n=== LOAD TEST 2: Подсчёт простых чисел ===");
        let pool = ThreadPool::with_config(Config::cpu_bound().with_threads(8));
        pool.start().unwrap();

        const CHUNK: u64 = 10_000;
        const CHUNKS: u64 = 20;
        let primes = Arc::new(AtomicUsize::new(0));

        measure("20 блоков по 10k чисел", || {
            for chunk in 0..CHUNKS {
                let primes = primes.clone();
                pool.submit(chunk as i64, move || {
                    let start = chunk * CHUNK;
                    let found = (start..start + CHUNK).filter(|&n| is_prime(n)).count();
                    primes.fetch_add(found, Ordering::SeqCst);
                })
                .unwrap();
            }
            pool.drain_and_stop().unwrap();
        });

        // pi(200_000)
        assert_eq!(primes.load(Ordering::SeqCst), 17_984);
        assert_eq!(pool.snapshot().completed, CHUNKS as usize);
    }

    #[test]
    fn load_test_3_concurrent_submitters() {
        println!("\n=== LOAD TEST 3: Параллельные отправители ===");
        let pool = Arc::new(ThreadPool::with_config(Config::io_bound()));
        pool.start().unwrap();

        let executed = Arc::new(AtomicUsize::new(0));
        let submitters: Vec<_> = (0..4)
            .map(|t| {
                let pool = pool.clone();
                let executed = executed.clone();
                thread::spawn(move || {
                    for i in 0..5_000_i64 {
                        let executed = executed.clone();
                        pool.submit(i % 100 - t, move || {
                            executed.fetch_add(1, Ordering::Relaxed);
                        })
                        .unwrap();
                    }
                })
            })
            .collect();

        measure("20k задач от 4 потоков", || {
            for s in submitters {
                s.join().unwrap();
            }
            pool.drain_and_stop().unwrap();
        });

        assert_eq!(executed.load(Ordering::Relaxed), 20_000);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.completed, 20_000);
        assert_eq!(snapshot.counts(), (0, 0, 0));
    }

    #[test]
    fn load_test_4_resize_churn() {
        println!("\n=== LOAD TEST 4: Постоянное изменение размера ===");
        let pool = ThreadPool::new(4);
        pool.start().unwrap();

        let executed = Arc::new(AtomicUsize::new(0));
        for round in 0..20 {
            pool.grow(3).unwrap();
            for i in 0..200 {
                let executed = executed.clone();
                pool.submit(i, move || {
                    std::hint::black_box(i * 2);
                    executed.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
            }
            pool.shrink(3).unwrap();

            let snapshot = pool.snapshot();
            assert!(snapshot.executing <= snapshot.target_workers, "round {}", round);
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while pool.snapshot().target_workers != 4 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(pool.snapshot().target_workers, 4);

        pool.drain_and_stop().unwrap();
        assert_eq!(executed.load(Ordering::Relaxed), 4_000);
    }

    #[test]
    fn load_test_5_panics_under_load() {
        println!("\n=== LOAD TEST 5: Стресс-тест с паниками ===");
        let pool = ThreadPool::new(8);
        pool.start().unwrap();

        let handles: Vec<_> = (0..1_000_i64)
            .map(|x| {
                pool.submit_with_handle(x, move || {
                    if x % 10 == 0 {
                        panic!("Intentional panic at {}", x);
                    }
                    x
                })
                .unwrap()
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
        let successful = results.iter().filter(|r| r.is_ok()).count();
        pool.drain_and_stop().unwrap();

        let snapshot = pool.snapshot();
        println!("  Успешно: {}", successful);
        println!("  Pool success rate: {:.1}%", snapshot.success_rate() * 100.0);
        assert_eq!(successful, 900);
        assert_eq!(snapshot.failed, 100);
        assert_eq!(snapshot.completed, 900);
    }
}
