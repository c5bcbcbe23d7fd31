#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textbuf::{BufferError, BufferPool, PoolOptions, TerminatorPolicy, View};

const SLOTS: usize = 4;

#[derive(Debug, Arbitrary)]
enum Op {
    Set { dest: u8, src: u8 },
    Append { dest: u8, src: u8 },
    Insert { dest: u8, index: u16, src: u8 },
    SetBytes { dest: u8, bytes: Vec<u8> },
    AppendBytes { dest: u8, bytes: Vec<u8> },
    InsertBytes { dest: u8, index: u16, bytes: Vec<u8> },
    Reserve { dest: u8, requested: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    set_only: bool,
    growth_floor: u8,
    literals: [Vec<u8>; SLOTS],
    ops: Vec<Op>,
}

/// Each slot owns one buffer and one view starting at offset 0, mirrored by a
/// plain `Vec<u8>`.
struct Slot {
    view: View,
    model: Vec<u8>,
}

fn run(input: Input) {
    let mut pool = BufferPool::new(PoolOptions {
        growth_floor: usize::from(input.growth_floor),
        terminator: if input.set_only {
            TerminatorPolicy::SetOnly
        } else {
            TerminatorPolicy::Always
        },
    });

    let mut slots: Vec<Slot> = input
        .literals
        .into_iter()
        .map(|bytes| Slot {
            view: pool.from_bytes(bytes.clone()).expect("small allocation"),
            model: bytes,
        })
        .collect();

    for op in input.ops {
        let (dest, result, expected) = match op {
            Op::Set { dest, src } | Op::Append { dest, src } | Op::Insert { dest, src, .. } => {
                let (d, s) = (usize::from(dest) % SLOTS, usize::from(src) % SLOTS);
                let src_view = slots[s].view;
                let src_bytes = slots[s].model.clone();
                let mut view = slots[d].view;
                let model = &mut slots[d].model;
                let (result, expected) = match op {
                    Op::Set { .. } => {
                        let result = pool.set(&mut view, &src_view);
                        if !src_bytes.is_empty() {
                            *model = src_bytes;
                        }
                        (result, Ok(model.len()))
                    }
                    Op::Append { .. } => {
                        let result = pool.append(&mut view, &src_view);
                        model.extend_from_slice(&src_bytes);
                        (result, Ok(model.len()))
                    }
                    Op::Insert { index, .. } => {
                        let index = usize::from(index);
                        let result = pool.insert(&mut view, index, &src_view);
                        if index > model.len() {
                            let length = model.len();
                            (result, Err(BufferError::IndexOutOfRange { index, length }))
                        } else {
                            model.splice(index..index, src_bytes);
                            (result, Ok(model.len()))
                        }
                    }
                    _ => unreachable!(),
                };
                slots[d].view = view;
                (d, result, expected)
            }
            Op::SetBytes { dest, bytes } => {
                let d = usize::from(dest) % SLOTS;
                let result = pool.set_bytes(&mut slots[d].view, &bytes);
                if !bytes.is_empty() {
                    slots[d].model = bytes;
                }
                (d, result, Ok(slots[d].model.len()))
            }
            Op::AppendBytes { dest, bytes } => {
                let d = usize::from(dest) % SLOTS;
                let result = pool.append_bytes(&mut slots[d].view, &bytes);
                slots[d].model.extend_from_slice(&bytes);
                (d, result, Ok(slots[d].model.len()))
            }
            Op::InsertBytes { dest, index, bytes } => {
                let d = usize::from(dest) % SLOTS;
                let index = usize::from(index);
                let result = pool.insert_bytes(&mut slots[d].view, index, &bytes);
                let length = slots[d].model.len();
                if index > length {
                    (d, result, Err(BufferError::IndexOutOfRange { index, length }))
                } else {
                    slots[d].model.splice(index..index, bytes);
                    (d, result, Ok(slots[d].model.len()))
                }
            }
            Op::Reserve { dest, requested } => {
                let d = usize::from(dest) % SLOTS;
                let id = slots[d].view.buffer();
                let before = pool.buffer(id).unwrap().capacity();
                let requested = usize::from(requested);
                assert_eq!(pool.ensure_capacity(id, requested), Ok(requested));
                let after = pool.buffer(id).unwrap().capacity();
                assert!(after >= before && after >= requested);
                (d, Ok(slots[d].model.len()), Ok(slots[d].model.len()))
            }
        };

        assert_eq!(result, expected);
        let slot = &slots[dest];
        assert_eq!(slot.view.len(), slot.model.len());
        assert_eq!(pool.bytes(&slot.view).unwrap(), slot.model.as_slice());
    }

    for slot in &slots {
        pool.release(slot.view.buffer()).unwrap();
    }
    pool.assert_consistent();
    assert!(pool.is_empty());
}

fuzz_target!(|input: Input| run(input));
