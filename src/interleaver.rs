//! Interleaver for sequences of a given length

use crate::Error;

/// Interleaver for sequences of a given length
#[derive(Eq, PartialEq, Debug)]
pub struct Interleaver {
    /// Length of input/output sequence
    pub(crate) length: usize,
    /// Input index for each output index (needed in interleaving)
    pub(crate) in_index_given_out_index: Vec<usize>,
    /// Output index for each input index (needed in deinterleaving)
    pub(crate) out_index_given_in_index: Vec<usize>,
}

impl Interleaver {
    /// Returns interleaver corresponding to a given permutation.
    ///
    /// # Parameters
    ///
    /// - `perm`: Permutation of integers in `[0, L)` for some positive integer `L`. If the
    ///   interleaver input is the sequence `x[0], x[1], ..., x[L-1]`, then its output is the
    ///   sequence `x[perm[0]], x[perm[1]], ..., x[perm[L-1]]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `perm` is not a permutation of the integers in `[0, L)` for some
    /// positive integer `L`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::Interleaver;
    ///
    /// let perm = [0, 3, 2, 5, 4, 7, 6, 1];
    /// let interleaver = Interleaver::new(&perm)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(perm: &[usize]) -> Result<Self, Error> {
        if perm.is_empty() {
            return Err(Error::InvalidInput(
                "Permutation defining interleaver cannot be empty".to_string(),
            ));
        }
        let perm_vec = perm.to_vec();
        let mut perm_vec_sorted = perm.to_vec();
        perm_vec_sorted.sort_unstable();
        if !perm_vec_sorted.into_iter().eq(0 .. perm_vec.len()) {
            return Err(Error::InvalidInput(format!(
                "Expected permutation of all integers in the range [0, {}), found {:?}",
                perm_vec.len(),
                perm_vec
            )));
        }
        Ok(Self::from_valid_perm(perm_vec))
    }

    /// Returns the length of the sequences this interleaver permutes.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generates interleaver output given its input.
    ///
    /// # Parameters
    ///
    /// - `input`: Interleaver input.
    ///
    /// - `output`: Buffer for interleaver output (any pre-existing contents will be cleared).
    ///
    /// # Errors
    ///
    /// Returns an error if `input.len()` is not equal to `self.length`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::Interleaver;
    ///
    /// let perm = [0, 3, 2, 5, 4, 7, 6, 1];
    /// let interleaver = Interleaver::new(&perm)?;
    /// let input = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
    /// let mut output = Vec::new();
    /// interleaver.interleave(&input, &mut output)?;
    /// assert_eq!(output, ['a', 'd', 'c', 'f', 'e', 'h', 'g', 'b']);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn interleave<T: Copy>(&self, input: &[T], output: &mut Vec<T>) -> Result<(), Error> {
        if input.len() != self.length {
            return Err(Error::InvalidInput(format!(
                "Invalid interleaver input length (expected {}, found {})",
                self.length,
                input.len()
            )));
        }
        output.clear();
        for out_index in 0 .. self.length {
            output.push(input[self.in_index_given_out_index[out_index]]);
        }
        Ok(())
    }

    /// Generates interleaver input given its output.
    ///
    /// # Parameters
    ///
    /// - `output`: Interleaver output.
    ///
    /// - `input`: Buffer for interleaver input (any pre-existing contents will be cleared).
    ///
    /// # Errors
    ///
    /// Returns an error if `output.len()` is not equal to `self.length`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::Interleaver;
    ///
    /// let perm = [0, 3, 2, 5, 4, 7, 6, 1];
    /// let interleaver = Interleaver::new(&perm)?;
    /// let output = ['a', 'd', 'c', 'f', 'e', 'h', 'g', 'b'];
    /// let mut input = Vec::new();
    /// interleaver.deinterleave(&output, &mut input)?;
    /// assert_eq!(input, ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h']);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn deinterleave<T: Copy>(&self, output: &[T], input: &mut Vec<T>) -> Result<(), Error> {
        if output.len() != self.length {
            return Err(Error::InvalidInput(format!(
                "Invalid interleaver output length (expected {}, found {})",
                self.length,
                output.len()
            )));
        }
        input.clear();
        for in_index in 0 .. self.length {
            input.push(output[self.out_index_given_in_index[in_index]]);
        }
        Ok(())
    }

    /// Interleaves into the first `self.length` entries of a preallocated slice.
    ///
    /// Entries of `output` beyond `self.length` are left untouched, which lets a caller keep
    /// trailing values (such as trellis termination terms) across repeated exchanges.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` or `output` holds fewer than `self.length` entries.
    pub fn interleave_into<T: Copy>(&self, input: &[T], output: &mut [T]) -> Result<(), Error> {
        self.check_slice_lengths(input.len(), output.len())?;
        for (out_index, &in_index) in self.in_index_given_out_index.iter().enumerate() {
            output[out_index] = input[in_index];
        }
        Ok(())
    }

    /// Deinterleaves into the first `self.length` entries of a preallocated slice.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` or `output` holds fewer than `self.length` entries.
    pub fn deinterleave_into<T: Copy>(&self, input: &[T], output: &mut [T]) -> Result<(), Error> {
        self.check_slice_lengths(input.len(), output.len())?;
        for (out_index, &in_index) in self.in_index_given_out_index.iter().enumerate() {
            output[in_index] = input[out_index];
        }
        Ok(())
    }

    /// Checks slice lengths for the in-place interleaving operations.
    fn check_slice_lengths(&self, input_len: usize, output_len: usize) -> Result<(), Error> {
        if input_len < self.length || output_len < self.length {
            return Err(Error::InvalidInput(format!(
                "Interleaver of length {} cannot permute slices of lengths {input_len} and {output_len}",
                self.length
            )));
        }
        Ok(())
    }

    /// Returns interleaver corresponding to a valid permutation.
    fn from_valid_perm(perm_vec: Vec<usize>) -> Self {
        let length = perm_vec.len();
        let in_index_given_out_index: Vec<usize> = perm_vec;
        let mut out_index_given_in_index: Vec<usize> = (0 .. length).collect();
        out_index_given_in_index.sort_by_key(|&k| in_index_given_out_index[k]);
        Self {
            length,
            in_index_given_out_index,
            out_index_given_in_index,
        }
    }
}

#[cfg(test)]
mod tests_of_interleaver {
    use super::*;

    #[test]
    fn test_new() {
        // Invalid input
        assert!(Interleaver::new(&[]).is_err());
        assert!(Interleaver::new(&[1, 2, 3, 4]).is_err());
        assert!(Interleaver::new(&[0, 1, 2, 4]).is_err());
        assert!(Interleaver::new(&[0, 0, 1, 2]).is_err());
        // Valid input
        let interleaver = Interleaver::new(&[0, 3, 2, 5, 4, 7, 6, 1]).unwrap();
        assert_eq!(interleaver.length, 8);
        assert_eq!(
            interleaver.in_index_given_out_index,
            [0, 3, 2, 5, 4, 7, 6, 1]
        );
        assert_eq!(
            interleaver.out_index_given_in_index,
            [0, 7, 2, 1, 4, 3, 6, 5]
        );
    }

    #[test]
    fn test_length() {
        let interleaver = Interleaver::new(&[2, 0, 1]).unwrap();
        assert_eq!(interleaver.length(), 3);
    }

    #[test]
    fn test_interleave() {
        let interleaver = Interleaver::new(&[0, 3, 2, 5, 4, 7, 6, 1]).unwrap();
        let mut output = Vec::new();
        // Invalid input
        let input = ['a', 'b', 'c', 'd', 'e', 'f', 'g'];
        assert!(interleaver.interleave(&input, &mut output).is_err());
        // Valid input
        let input = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
        for _ in 0 .. 2 {
            interleaver.interleave(&input, &mut output).unwrap();
            assert_eq!(output, ['a', 'd', 'c', 'f', 'e', 'h', 'g', 'b']);
        }
    }

    #[test]
    fn test_deinterleave() {
        let interleaver = Interleaver::new(&[0, 3, 2, 5, 4, 7, 6, 1]).unwrap();
        let mut input = Vec::new();
        // Invalid output
        let output = ['a', 'd', 'c', 'f', 'e', 'h', 'g'];
        assert!(interleaver.deinterleave(&output, &mut input).is_err());
        // Valid output
        let output = ['a', 'd', 'c', 'f', 'e', 'h', 'g', 'b'];
        for _ in 0 .. 2 {
            interleaver.deinterleave(&output, &mut input).unwrap();
            assert_eq!(input, ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h']);
        }
    }

    #[test]
    fn test_interleave_into() {
        let interleaver = Interleaver::new(&[0, 3, 2, 5, 4, 7, 6, 1]).unwrap();
        // Invalid input
        let mut short = [0i16; 7];
        assert!(interleaver
            .interleave_into(&[0i16; 8], &mut short)
            .is_err());
        // Valid input, trailing entries untouched
        let input: Vec<i16> = (10 .. 18).collect();
        let mut output = [0i16; 10];
        output[8] = 91;
        output[9] = 92;
        interleaver.interleave_into(&input, &mut output).unwrap();
        assert_eq!(output, [10, 13, 12, 15, 14, 17, 16, 11, 91, 92]);
    }

    #[test]
    fn test_deinterleave_into() {
        let interleaver = Interleaver::new(&[0, 3, 2, 5, 4, 7, 6, 1]).unwrap();
        // Invalid input
        let mut short = [0i16; 7];
        assert!(interleaver
            .deinterleave_into(&[0i16; 8], &mut short)
            .is_err());
        // Valid input, round trip through both in-place operations
        let input: Vec<i16> = (10 .. 18).collect();
        let mut permuted = [0i16; 8];
        interleaver.interleave_into(&input, &mut permuted).unwrap();
        let mut restored = [0i16; 8];
        interleaver
            .deinterleave_into(&permuted, &mut restored)
            .unwrap();
        assert_eq!(restored.to_vec(), input);
    }

    #[test]
    fn test_from_valid_perm() {
        let interleaver = Interleaver::from_valid_perm(vec![0, 3, 2, 5, 4, 7, 6, 1]);
        assert_eq!(interleaver.length, 8);
        assert_eq!(
            interleaver.in_index_given_out_index,
            [0, 3, 2, 5, 4, 7, 6, 1]
        );
        assert_eq!(
            interleaver.out_index_given_in_index,
            [0, 7, 2, 1, 4, 3, 6, 5]
        );
    }
}
