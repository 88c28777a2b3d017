pub mod encoder_machine;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;
