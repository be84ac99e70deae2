// Test modules for uadb




#[cfg(test)]
pub mod source_tests;

#[cfg(test)]
pub mod metadata_tests;




#[cfg(test)]
pub mod dataset_tests;
