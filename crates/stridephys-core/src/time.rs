#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub substeps: u32,
    pub pairs_tested: u32,
    pub contacts: u32,
}
