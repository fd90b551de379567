// Additional tests for pow.rs to verify security fixes
// Add these tests to pow.rs test module
