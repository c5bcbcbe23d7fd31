use alloc::{boxed::Box, vec::Vec};

use quickcheck::{Arbitrary, Gen, QuickCheck};
use quickcheck_macros::quickcheck;

use crate::{Buffer, BufferError, BufferPool, PoolOptions, TerminatorPolicy};

#[derive(Debug, Clone)]
enum Op {
    Set(Vec<u8>),
    Append(Vec<u8>),
    Insert(usize, Vec<u8>),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        let bytes = Vec::<u8>::arbitrary(g);
        match u8::arbitrary(g) % 3 {
            0 => Op::Set(bytes),
            1 => Op::Append(bytes),
            _ => Op::Insert(usize::arbitrary(g), bytes),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self.clone() {
            Op::Set(bytes) => Box::new(bytes.shrink().map(Op::Set)),
            Op::Append(bytes) => Box::new(bytes.shrink().map(Op::Append)),
            Op::Insert(index, bytes) => Box::new(bytes.shrink().map(move |b| Op::Insert(index, b))),
        }
    }
}

/// Applies the same operations to a view and to a plain `Vec<u8>` and checks
/// that content, capacity and terminator agree after every step.
fn replay(ops: &[Op], policy: TerminatorPolicy, prefix: usize) -> bool {
    let mut pool = BufferPool::new(PoolOptions {
        terminator: policy,
        ..Default::default()
    });
    let padding: Vec<u8> = (0..prefix).map(|i| b'a' + (i % 26) as u8).collect();
    let whole = pool.from_bytes(padding.clone()).unwrap();
    let mut view = pool.subview(&whole, prefix, 0).unwrap();
    let mut model: Vec<u8> = Vec::new();
    let mut capacity = pool.buffer(view.buffer()).unwrap().capacity();

    for op in ops {
        let result = match op {
            Op::Set(bytes) => {
                let result = pool.set_bytes(&mut view, bytes);
                if !bytes.is_empty() {
                    model.clone_from(bytes);
                }
                result
            }
            Op::Append(bytes) => {
                model.extend_from_slice(bytes);
                pool.append_bytes(&mut view, bytes)
            }
            Op::Insert(index, bytes) => {
                // Keep most indices valid while still exercising rejection.
                let index = index % (model.len() + 2);
                let result = pool.insert_bytes(&mut view, index, bytes);
                if index > model.len() {
                    if result
                        != Err(BufferError::IndexOutOfRange {
                            index,
                            length: model.len(),
                        })
                    {
                        return false;
                    }
                    continue;
                }
                model.splice(index..index, bytes.iter().copied());
                result
            }
        };

        if result != Ok(model.len()) {
            return false;
        }

        let buffer = pool.buffer(view.buffer()).unwrap();
        if buffer.capacity() < capacity || view.end() > buffer.capacity() {
            return false;
        }
        capacity = buffer.capacity();

        if pool.bytes(&view).unwrap() != model.as_slice() {
            return false;
        }
        // Bytes in front of the view are never touched.
        if &buffer.as_bytes()[..prefix] != padding.as_slice() {
            return false;
        }
        let wrote = match op {
            Op::Set(bytes) => !bytes.is_empty(),
            Op::Append(bytes) | Op::Insert(_, bytes) => {
                !bytes.is_empty() && policy == TerminatorPolicy::Always
            }
        };
        if wrote && buffer.as_bytes()[view.end()] != 0 {
            return false;
        }
    }
    true
}

#[test]
fn view_operations_match_vec_model() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(ops: Vec<Op>, set_only: bool, prefix: u8) -> bool {
        let policy = if set_only {
            TerminatorPolicy::SetOnly
        } else {
            TerminatorPolicy::Always
        };
        replay(&ops, policy, usize::from(prefix % 16))
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Vec<Op>, bool, u8) -> bool);
}

#[quickcheck]
fn growth_is_monotonic_and_idempotent(requests: Vec<u16>) -> bool {
    let mut buf = Buffer::new();
    let mut previous = 0;
    for requested in requests {
        let requested = usize::from(requested);
        if buf.ensure_capacity(requested) != Ok(requested) {
            return false;
        }
        let once = buf.capacity();
        buf.ensure_capacity(requested).unwrap();
        if buf.capacity() != once || once < previous || once < requested {
            return false;
        }
        previous = once;
    }
    true
}
