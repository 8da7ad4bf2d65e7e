pub mod form_submitter;

pub use form_submitter::FormSubmitter;
