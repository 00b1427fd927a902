//! Patch builder and trampoline benchmarks.

use asmpatch::trampoline;
use asmpatch::{PatchBuilder, Reg32};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn hook_patch(site: usize, hook: usize) -> usize {
    PatchBuilder::new(site)
        .push(Reg32::Ebp)
        .safe_call(hook)
        .ret_stdcall_full()
        .jmp(site + 64)
        .nop_pad_to_size(48)
        .map(|b| b.finalize().len())
        .unwrap_or(0)
}

fn bench_builder(c: &mut Criterion) {
    c.bench_function("hook_patch", |b| {
        b.iter(|| hook_patch(black_box(0x0040_1000), black_box(0x1000_0000)))
    });

    c.bench_function("append_256_dwords", |b| {
        b.iter(|| {
            let mut builder = PatchBuilder::with_capacity(0, 1024);
            for i in 0..256u32 {
                builder = builder.dword(black_box(i));
            }
            builder.finalize()
        })
    });
}

fn bench_trampoline(c: &mut Criterion) {
    let ptr = trampoline::create_fn_ptr(|a: u32, b: u32| a.wrapping_mul(b)).unwrap();
    c.bench_function("trampoline_dispatch", |b| {
        b.iter(|| ptr(black_box(6), black_box(7)))
    });
}

criterion_group!(benches, bench_builder, bench_trampoline);
criterion_main!(benches);
