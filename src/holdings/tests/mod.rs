mod reconciler_tests;
