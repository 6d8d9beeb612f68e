// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_bindable`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use understory_bindable::{DependencyMap, Property, PropertyBag};

const COUNT: Property<u64> = Property::new("Count");
const TITLE: Property<String> = Property::new("Title");

/// A bag with `n` stored properties named `P0..Pn`.
fn populated(n: usize) -> PropertyBag {
    let bag = PropertyBag::new();
    for i in 0..n {
        bag.set_by_name(&format!("P{i}"), i as u64 + 1, false).unwrap();
    }
    bag
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("bindable/read");

    for size in [1_usize, 16, 256] {
        let bag = populated(size);
        bag.set(COUNT, 7);
        group.bench_function(BenchmarkId::new("get/u64", size), |b| {
            b.iter(|| black_box(bag.get(COUNT)))
        });
    }

    let bag = PropertyBag::new();
    bag.set(TITLE, "hello world hello world hello world".to_owned());
    group.bench_function("get/string", |b| b.iter(|| black_box(bag.get(TITLE))));
    group.bench_function("get/absent", |b| {
        b.iter(|| black_box(bag.get(COUNT)))
    });

    group.finish();
}

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("bindable/set");

    group.bench_function("unchanged", |b| {
        let bag = PropertyBag::new();
        bag.set(COUNT, 1);
        b.iter(|| black_box(bag.set(COUNT, black_box(1))))
    });

    group.bench_function("changed/no_listener", |b| {
        let bag = PropertyBag::new();
        let mut next = 0_u64;
        b.iter(|| {
            next = next.wrapping_add(1);
            black_box(bag.set(COUNT, next))
        })
    });

    group.bench_function("changed/one_listener", |b| {
        let bag = PropertyBag::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = bag.subscribe(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let mut next = 0_u64;
        b.iter(|| {
            next = next.wrapping_add(1);
            black_box(bag.set(COUNT, next))
        })
    });

    let deps = Arc::new(
        DependencyMap::builder()
            .affects("Count", ["Total", "Average", "Summary"])
            .affects("Summary", ["Banner"])
            .build(),
    );
    group.bench_function("changed/declared_fanout", |b| {
        let bag = PropertyBag::with_dependencies(Arc::clone(&deps));
        let _sub = bag.subscribe(|name| {
            black_box(name);
        });
        let mut next = 0_u64;
        b.iter(|| {
            next = next.wrapping_add(1);
            black_box(bag.set(COUNT, next))
        })
    });

    group.bench_function("changed/explicit_fanout", |b| {
        let bag = PropertyBag::new();
        let _sub = bag.subscribe(|name| {
            black_box(name);
        });
        let mut next = 0_u64;
        b.iter(|| {
            next = next.wrapping_add(1);
            black_box(bag.set_and_notify(COUNT, next, &["Total", "Average", "Summary"]))
        })
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("bindable/batch");

    for writes in [8_u64, 64] {
        group.bench_function(BenchmarkId::new("coalesced_writes", writes), |b| {
            b.iter_batched(
                || {
                    let bag = PropertyBag::new();
                    let sub = bag.subscribe(|name| {
                        black_box(name);
                    });
                    (bag, sub)
                },
                |(bag, sub)| {
                    {
                        let _batch = bag.batch();
                        for value in 1..=writes {
                            bag.set(COUNT, value);
                        }
                    }
                    black_box((bag, sub));
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("notify_all/64", |b| {
        let bag = populated(64);
        let _sub = bag.subscribe(|name| {
            black_box(name);
        });
        b.iter(|| bag.notify_all())
    });

    group.finish();
}

criterion_group!(benches, bench_read, bench_set, bench_batch);
criterion_main!(benches);
