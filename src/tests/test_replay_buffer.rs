use ndarray::array;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use crate::error::DqnError;
use crate::replay_buffer::{ReplayBuffer, Transition, DEFAULT_CAPACITY};

fn transition(i: usize) -> Transition {
    Transition::new(array![i as f32], i % 2, i as f32, array![(i + 1) as f32], false)
}

#[test]
fn test_replay_buffer_store_and_sample() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut replay_buffer = ReplayBuffer::new(10);
    let experience = transition(7);
    replay_buffer.store(experience.clone());
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample(1, &mut rng);
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_replay_buffer_capacity() {
    let mut buffer = ReplayBuffer::new(3);

    // T1..T5 into a buffer of three
    for i in 1..=5 {
        buffer.store(transition(i));
    }

    assert_eq!(buffer.len(), 3);
    let states: Vec<f32> = buffer.iter().map(|t| t.state[0]).collect();
    assert_eq!(states, vec![3.0, 4.0, 5.0]);
}

#[test]
fn test_sample_larger_than_buffer() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(3);
    for i in 1..=5 {
        buffer.store(transition(i));
    }

    let samples = buffer.sample(10, &mut rng);
    assert_eq!(samples.len(), 3);
    let states: HashSet<i64> = samples.iter().map(|t| t.state[0] as i64).collect();
    assert_eq!(states, [3, 4, 5].into_iter().collect());
}

#[test]
fn test_sample_is_without_replacement() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = ReplayBuffer::new(100);
    for i in 0..100 {
        buffer.store(transition(i));
    }

    for _ in 0..20 {
        let samples = buffer.sample(64, &mut rng);
        let distinct: HashSet<i64> = samples.iter().map(|t| t.state[0] as i64).collect();
        assert_eq!(distinct.len(), 64);
    }
}

#[test]
fn test_sample_empty_buffer() {
    let mut rng = StdRng::seed_from_u64(3);
    let buffer = ReplayBuffer::new(5);
    assert!(buffer.sample(4, &mut rng).is_empty());

    let mut buffer = ReplayBuffer::new(5);
    buffer.store(transition(0));
    assert!(buffer.sample(0, &mut rng).is_empty());
}

#[test]
fn test_replay_buffer_is_empty_and_clear() {
    let mut buffer = ReplayBuffer::default();
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);

    buffer.store(transition(0));
    assert!(!buffer.is_empty());

    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_zero_capacity_is_rejected() {
    assert!(matches!(
        ReplayBuffer::with_capacity(0),
        Err(DqnError::InvalidParameter { .. })
    ));
}

#[test]
fn test_sampling_is_roughly_uniform() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut buffer = ReplayBuffer::new(4);
    for i in 0..4 {
        buffer.store(transition(i));
    }

    let mut counts = [0usize; 4];
    for _ in 0..4000 {
        for t in buffer.sample(1, &mut rng) {
            counts[t.state[0] as usize] += 1;
        }
    }
    for count in counts {
        assert!((800..1200).contains(&count), "skewed sample counts {:?}", counts);
    }
}
