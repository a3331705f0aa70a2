mod ring_buffer_tests;
