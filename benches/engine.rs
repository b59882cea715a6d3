//! Engine performance benchmarks (Criterion).
//!
//! Run: `cargo bench` or `cargo bench --bench engine`.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rust_decimal::Decimal;
use tickbook_engine::market_data_gen::{Generator, GeneratorConfig};
use tickbook_engine::{Engine, EngineConfig, Order, OrderId, OrderType, Side, Symbol};

fn engine() -> Engine {
    Engine::new(EngineConfig {
        feed_enabled: false,
        ..Default::default()
    })
}

fn limit_stream(seed: u64, n: usize) -> Vec<Order> {
    Generator::new(GeneratorConfig {
        seed,
        num_orders: n,
        limit_ratio: 1.0,
        market_ratio: 0.0,
        ..Default::default()
    })
    .all_orders()
}

fn bench_submit_order_throughput(c: &mut Criterion) {
    const N: usize = 1000;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("submit_order_1000_mixed", |b| {
        b.iter_batched(
            || {
                let orders = Generator::new(GeneratorConfig {
                    seed: 42,
                    num_orders: N,
                    ..Default::default()
                })
                .all_orders();
                (engine(), orders)
            },
            |(engine, orders)| {
                for order in orders {
                    let _ = engine.submit_order(order);
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_cancel_order(c: &mut Criterion) {
    const RESTING: usize = 500;
    const CANCELS_PER_ITER: usize = 100;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(CANCELS_PER_ITER as u64));
    group.bench_function("cancel_order_100_after_500_resting", |b| {
        b.iter_batched(
            || {
                let engine = engine();
                let orders = limit_stream(123, RESTING);
                for order in &orders {
                    engine.submit_order(order.clone());
                }
                let cancel_ids: Vec<OrderId> = orders[..CANCELS_PER_ITER]
                    .iter()
                    .map(|o| o.order_id)
                    .collect();
                (engine, cancel_ids)
            },
            |(engine, cancel_ids)| {
                let symbol = Symbol::from("SIM");
                for id in cancel_ids {
                    engine.cancel_order(&symbol, id);
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_market_sweep(c: &mut Criterion) {
    const RESTING: u64 = 200;
    let mut group = c.benchmark_group("engine");
    group.bench_function("market_buy_sweeps_200_asks", |b| {
        b.iter_batched(
            || {
                let engine = engine();
                for i in 0..RESTING {
                    engine.submit_order(Order::at(
                        OrderId(i + 1),
                        "maker",
                        "SIM",
                        Side::Sell,
                        OrderType::Limit,
                        Decimal::from(100 + (i % 20) as i64),
                        Decimal::from(5),
                        i + 1,
                    ));
                }
                engine
            },
            |engine| {
                engine.submit_order(Order::at(
                    OrderId(RESTING + 1),
                    "taker",
                    "SIM",
                    Side::Buy,
                    OrderType::Market,
                    Decimal::ZERO,
                    Decimal::from(RESTING * 5),
                    RESTING + 1,
                ))
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_market_depth(c: &mut Criterion) {
    let engine = engine();
    for order in limit_stream(7, 2000) {
        engine.submit_order(order);
    }
    let symbol = Symbol::from("SIM");
    c.bench_function("market_depth_10_levels", |b| {
        b.iter(|| engine.market_depth(&symbol, 10))
    });
}

criterion_group!(
    benches,
    bench_submit_order_throughput,
    bench_cancel_order,
    bench_market_sweep,
    bench_market_depth
);
criterion_main!(benches);
