use compare::{Capabilities, Dispatcher};
use divan::counter::BytesCount;
use divan::{black_box, Bencher};
use utils::random_pair;

const SIZES: &[usize] = &[64, 1280, 1 << 16, 1 << 20];

fn main() {
    divan::main();
}

fn run(bencher: Bencher, dispatcher: Dispatcher, len: usize) {
    let (a, b) = random_pair(len, 1);
    bencher
        .counter(BytesCount::new(2 * len))
        .bench(|| dispatcher.sum_square_error(black_box(&a), black_box(&b)));
}

#[divan::bench(args = SIZES)]
fn dispatched(bencher: Bencher, len: usize) {
    run(bencher, Dispatcher::global(), len);
}

#[divan::bench(args = SIZES)]
fn wide(bencher: Bencher, len: usize) {
    run(bencher, Dispatcher::new(Capabilities::WIDE), len);
}

#[divan::bench(args = SIZES)]
fn scalar(bencher: Bencher, len: usize) {
    run(bencher, Dispatcher::new(Capabilities::NONE), len);
}

#[divan::bench(args = [1 << 24])]
fn parallel(bencher: Bencher, len: usize) {
    let (a, b) = random_pair(len, 1);
    bencher
        .counter(BytesCount::new(2 * len))
        .bench(|| compare::par::par_sum_square_error(black_box(&a), black_box(&b)));
}
