mod smoke_tests;

// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the library:
// - calendar_actor: Calendar state, filtering and navigation against an in-memory event source
// - event_source_http: The REST event source against a mock HTTP server
// - meeting_providers: Meeting providers, sign-in and the creation dialog
// - smoke_tests: Configuration and wiring
