use rand::Rng;

/// Unbiased in-place Fisher-Yates shuffle.
///
/// Walks from the last index down to 1 and swaps each slot with a uniformly
/// chosen index in `0..=i`, so every permutation is equally likely.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Combine the correct answer with its distractors in a random presentation order.
pub fn shuffle_answers<R: Rng + ?Sized>(
    correct: &str,
    incorrect: &[String],
    rng: &mut R,
) -> Vec<String> {
    let mut answers = Vec::with_capacity(incorrect.len() + 1);
    answers.push(correct.to_string());
    answers.extend(incorrect.iter().cloned());
    fisher_yates(&mut answers, rng);
    answers
}
