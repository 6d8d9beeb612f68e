// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_command`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use futures::future;
use futures::task::{FutureObj, Spawn, SpawnError};
use understory_command::{ActionError, Command, Invoke};

fn bench_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("command/sync");

    let total = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&total);
    let add: Command<u64> = Command::new(move |value| {
        sink.fetch_add(value, Ordering::Relaxed);
    });
    group.bench_function("execute", |b| b.iter(|| black_box(add.execute(black_box(1)))));

    let guarded: Command<u64> = Command::builder()
        .can_execute(|value: &u64| *value % 2 == 1)
        .action(|value| {
            black_box(value);
        });
    group.bench_function("can_execute", |b| {
        b.iter(|| black_box(guarded.can_execute(black_box(&3))))
    });

    let erased: Box<dyn Invoke> = Box::new(add.clone());
    group.bench_function("invoke_erased", |b| {
        b.iter(|| black_box(erased.invoke(Some(&1_u64))))
    });

    group.finish();
}

fn bench_async(c: &mut Criterion) {
    let mut group = c.benchmark_group("command/async");

    // Each iteration drives the admitted future itself, so the spawner is never used.
    let command: Command = Command::builder().async_action(NoSpawn, |()| {
        future::ready(Ok::<(), ActionError>(()))
    });
    let _sub = command.subscribe(|| {});

    group.bench_function("begin_and_settle", |b| {
        b.iter(|| {
            let pending = command.begin(()).unwrap();
            black_box(block_on(pending)).unwrap();
        })
    });

    group.finish();
}

struct NoSpawn;

impl Spawn for NoSpawn {
    fn spawn_obj(&self, _future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }
}

criterion_group!(benches, bench_sync, bench_async);
criterion_main!(benches);
