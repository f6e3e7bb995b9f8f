mod access_code_ws_test;
