use phf::{Map, Set, phf_map, phf_set};

static AMINO_ACID_CODES: Set<char> = phf_set! {
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W', 'Y',
    'X',
};

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "CYS" => 'C', "ASP" => 'D', "GLU" => 'E', "PHE" => 'F',
    "GLY" => 'G', "HIS" => 'H', "ILE" => 'I', "LYS" => 'K', "LEU" => 'L',
    "MET" => 'M', "ASN" => 'N', "PRO" => 'P', "GLN" => 'Q', "ARG" => 'R',
    "SER" => 'S', "THR" => 'T', "VAL" => 'V', "TRP" => 'W', "TYR" => 'Y',
    "HSE" => 'H', "HSD" => 'H', "HSP" => 'H', "HIE" => 'H', "HID" => 'H', "HIP" => 'H',
    "MSE" => 'M', "CYX" => 'C',
};

/// Returns `true` for the twenty standard one-letter codes and `X` (unknown).
/// Lower-case input is accepted.
pub fn is_amino_acid(code: char) -> bool {
    AMINO_ACID_CODES.contains(&code.to_ascii_uppercase())
}

/// Returns the index of the first character that is not an amino-acid code.
pub fn first_invalid_residue(sequence: &str) -> Option<(usize, char)> {
    sequence.chars().enumerate().find(|(_, c)| !is_amino_acid(*c))
}

pub fn one_letter_code(residue_name: &str) -> Option<char> {
    THREE_TO_ONE
        .get(residue_name.trim().to_ascii_uppercase().as_str())
        .copied()
}
